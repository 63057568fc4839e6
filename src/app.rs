// Command dispatch: one parsed command in, one reply out.

use std::sync::Arc;

use tracing::warn;

use crate::board::BoardGenerator;
use crate::db::Database;
use crate::error::CoreError;
use crate::presets::PresetStore;
use crate::protocol::{Command, Reply};
use crate::resolver::CategoryResolver;
use crate::wiki::WikiLookup;

pub struct App {
    store: PresetStore,
    resolver: CategoryResolver,
    board: BoardGenerator,
    board_size: usize,
    category_limit: usize,
}

impl App {
    pub fn new(
        db: Arc<Database>,
        source: Arc<dyn WikiLookup>,
        board_size: usize,
        category_limit: usize,
    ) -> Self {
        let store = PresetStore::new(Arc::clone(&db), Arc::clone(&source));
        let resolver = CategoryResolver::new(Arc::clone(&db), source);
        let board = BoardGenerator::new(db, resolver.clone(), category_limit);
        Self {
            store,
            resolver,
            board,
            board_size,
            category_limit,
        }
    }

    /// Handle one command. Never errors: every failure becomes a `Failure`
    /// reply carrying the error's display text.
    pub async fn handle(&self, command: Command) -> Reply {
        match self.dispatch(command).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(error = %err, "command failed");
                Reply::Failure {
                    message: err.to_string(),
                }
            }
        }
    }

    async fn dispatch(&self, command: Command) -> Result<Reply, CoreError> {
        match command {
            Command::ListPresets => Ok(Reply::ListPresets {
                presets: self.store.list()?,
            }),

            Command::PresetContents { name } => Ok(Reply::PresetContents {
                entries: self.store.contents(&name)?,
                name,
            }),

            Command::CreatePreset { name, entries } => {
                self.store.create(&name, None, &entries).await?;
                Ok(Reply::Ack {
                    message: format!("Created preset {name}."),
                })
            }

            Command::DeletePreset { name } => {
                self.store.delete(&name)?;
                Ok(Reply::Ack {
                    message: format!("Deleted preset {name}."),
                })
            }

            Command::UpdatePreset { name, entries } => {
                self.store.update(&name, &entries).await?;
                Ok(Reply::Ack {
                    message: format!("Replaced the entries of preset {name}."),
                })
            }

            Command::AppendToPreset { name, entries } => {
                self.store.append(&name, &entries).await?;
                Ok(Reply::Ack {
                    message: format!("Added entries to preset {name}."),
                })
            }

            Command::RemoveFromPreset { name, entries } => {
                self.store.remove(&name, &entries)?;
                Ok(Reply::Ack {
                    message: format!("Removed entries from preset {name}."),
                })
            }

            Command::StartGame { game_type, preset } => {
                let board = self.board.generate(&preset, self.board_size).await?;
                Ok(Reply::GameStarted {
                    game_type,
                    preset,
                    board,
                })
            }

            Command::RefreshCategory { category } => {
                let pages = self
                    .resolver
                    .refresh(&category, self.category_limit)
                    .await?;
                Ok(Reply::Ack {
                    message: format!("Refreshed {category}: {} pages cached.", pages.len()),
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
