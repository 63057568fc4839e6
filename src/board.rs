// Board generation: expand a preset into a candidate pool and sample
// squares from it.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use crate::db::Database;
use crate::entries::EntryType;
use crate::error::CoreError;
use crate::resolver::CategoryResolver;

/// Squares on a standard 5x5 board.
pub const DEFAULT_BOARD_SIZE: usize = 25;

pub struct BoardGenerator {
    db: Arc<Database>,
    resolver: CategoryResolver,
    category_limit: usize,
}

impl BoardGenerator {
    pub fn new(db: Arc<Database>, resolver: CategoryResolver, category_limit: usize) -> Self {
        Self {
            db,
            resolver,
            category_limit,
        }
    }

    /// Build the candidate pool for a preset: every article entry
    /// contributes itself, every category entry contributes its expansion.
    /// Expansions are concatenated as-is; an article reachable through two
    /// categories appears twice and is proportionally likelier to be drawn.
    pub async fn pool(&self, preset: &str) -> Result<Vec<String>, CoreError> {
        let Some(entry_names) = self.db.preset_entries(preset)? else {
            return Err(CoreError::PresetNotFound(preset.to_string()));
        };

        let mut pool = Vec::new();
        for name in entry_names {
            match self.db.entry_type(&name).map_err(CoreError::Storage)? {
                Some(EntryType::Article) => pool.push(name),
                Some(EntryType::Category) => {
                    let pages = self.resolver.resolve(&name, self.category_limit).await?;
                    pool.extend(pages);
                }
                None => {
                    return Err(CoreError::Storage(anyhow::anyhow!(
                        "entry `{name}` referenced by preset `{preset}` is missing from the registry"
                    )))
                }
            }
        }

        Ok(pool)
    }

    /// Generate a board of `size` squares from a preset's pool.
    pub async fn generate(&self, preset: &str, size: usize) -> Result<Vec<String>, CoreError> {
        let pool = self.pool(preset).await?;
        // thread_rng is created only after all awaits have completed; it is
        // not Send and must not be held across an await point.
        let board = sample(pool, size, &mut rand::thread_rng())?;
        info!(preset, squares = board.len(), "board generated");
        Ok(board)
    }

    /// Like `generate`, but with a caller-supplied RNG for deterministic
    /// draws.
    pub async fn generate_with_rng<R: Rng>(
        &self,
        preset: &str,
        size: usize,
        rng: &mut R,
    ) -> Result<Vec<String>, CoreError> {
        let pool = self.pool(preset).await?;
        sample(pool, size, rng)
    }
}

/// Uniform sample of `size` elements without replacement. Each pool slot
/// is its own candidate, so duplicated pool entries carry their duplicate
/// weight into the draw.
fn sample<R: Rng>(pool: Vec<String>, size: usize, rng: &mut R) -> Result<Vec<String>, CoreError> {
    if pool.len() < size {
        return Err(CoreError::InsufficientPool {
            available: pool.len(),
            requested: size,
        });
    }
    Ok(pool.choose_multiple(rng, size).cloned().collect())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
