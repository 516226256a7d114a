use uuid::Uuid;

use crate::adjust::{Adjustments, adjust_with};
use crate::buffer::PixelBuffer;
use crate::commands::{CommandHistory, Snapshot};
use crate::config::EngineConfig;
use crate::effects::Filter;
use crate::error::Result;

/// One editing session: the loaded image, the working result and its history.
///
/// Filters and adjustments always read `original`, so successive edits
/// replace one another rather than stacking. The session changes only when
/// an operation succeeds.
#[derive(Debug, Clone)]
pub struct EditSession {
    id: Uuid,
    original: PixelBuffer,
    current: PixelBuffer,
    history: CommandHistory,
    config: EngineConfig,
}

impl EditSession {
    pub fn new(original: PixelBuffer) -> Result<Self> {
        Self::with_config(original, EngineConfig::default())
    }

    pub fn with_config(original: PixelBuffer, config: EngineConfig) -> Result<Self> {
        original.validate()?;
        config.validate()?;
        let id = Uuid::new_v4();
        tracing::info!(
            session = %id,
            width = original.width,
            height = original.height,
            channels = original.channels,
            "opened edit session"
        );
        Ok(Self {
            id,
            current: original.clone(),
            original,
            history: CommandHistory::new(),
            config,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn original(&self) -> &PixelBuffer {
        &self.original
    }

    pub fn current(&self) -> &PixelBuffer {
        &self.current
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Apply `filter` to the original and make the result current.
    pub fn apply_filter(&mut self, filter: Filter) -> Result<&PixelBuffer> {
        let result = filter.apply_with(&self.original, &self.config)?;
        self.commit(filter.name(), result);
        Ok(&self.current)
    }

    /// Apply brightness/contrast/sharpness to the original and make the
    /// result current.
    pub fn apply_adjustments(&mut self, adjustments: &Adjustments) -> Result<&PixelBuffer> {
        let result = adjust_with(&self.original, adjustments, &self.config.sharpen)?;
        let description = format!(
            "Adjust b={} c={} s={}",
            adjustments.brightness, adjustments.contrast, adjustments.sharpness
        );
        self.commit(&description, result);
        Ok(&self.current)
    }

    fn commit(&mut self, description: &str, result: PixelBuffer) {
        let previous = std::mem::replace(&mut self.current, result);
        self.history.record(Snapshot {
            description: description.to_string(),
            buffer: previous,
        });
        tracing::info!(
            session = %self.id,
            edit = description,
            undo = self.history.undo_len(),
            "recorded edit"
        );
    }

    /// Restore the state before the most recent edit.
    pub fn undo(&mut self) -> Result<&PixelBuffer> {
        let snapshot = self.history.pop_undo()?;
        let replaced = std::mem::replace(&mut self.current, snapshot.buffer);
        self.history.push_redo(Snapshot {
            description: snapshot.description,
            buffer: replaced,
        });
        tracing::info!(session = %self.id, undo = self.history.undo_len(), "undo");
        Ok(&self.current)
    }

    /// Re-apply the most recently undone edit.
    pub fn redo(&mut self) -> Result<&PixelBuffer> {
        let snapshot = self.history.pop_redo()?;
        let replaced = std::mem::replace(&mut self.current, snapshot.buffer);
        self.history.push_undo(Snapshot {
            description: snapshot.description,
            buffer: replaced,
        });
        tracing::info!(session = %self.id, redo = self.history.redo_len(), "redo");
        Ok(&self.current)
    }

    /// Load new media: current is reset and history dropped.
    pub fn replace_original(&mut self, original: PixelBuffer) -> Result<()> {
        original.validate()?;
        self.current = original.clone();
        self.original = original;
        self.history.clear();
        tracing::info!(session = %self.id, "replaced original");
        Ok(())
    }
}
