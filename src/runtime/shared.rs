use crate::config::InspectionConfig;
use crate::image::Frame;
use crate::util::MarkAlignResult;
use parking_lot::Mutex;
use std::sync::Arc;

/// Consistent view of the shared state taken under one lock.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub frame: Option<Arc<Frame>>,
    pub config: Arc<InspectionConfig>,
}

struct Inner {
    frame: Option<Arc<Frame>>,
    config: Arc<InspectionConfig>,
}

/// Latest frame plus active configuration.
///
/// The frame slot holds only the most recent frame; readers get a cheap
/// reference that stays valid after the slot is replaced.
pub struct SharedState {
    inner: Mutex<Inner>,
}

impl SharedState {
    pub fn new(config: InspectionConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                frame: None,
                config: Arc::new(config),
            }),
        }
    }

    /// Stores `frame` as the latest one and returns the previous.
    pub fn replace_frame(&self, frame: impl Into<Arc<Frame>>) -> Option<Arc<Frame>> {
        self.inner.lock().frame.replace(frame.into())
    }

    pub fn clear_frame(&self) -> Option<Arc<Frame>> {
        self.inner.lock().frame.take()
    }

    pub fn frame(&self) -> Option<Arc<Frame>> {
        self.inner.lock().frame.clone()
    }

    pub fn config(&self) -> Arc<InspectionConfig> {
        Arc::clone(&self.inner.lock().config)
    }

    /// Installs a validated configuration; an invalid one leaves the current
    /// configuration in place.
    pub fn set_config(&self, config: InspectionConfig) -> MarkAlignResult<()> {
        config.validate()?;
        self.inner.lock().config = Arc::new(config);
        Ok(())
    }

    /// Edits a copy of the configuration and installs it when still valid.
    pub fn update_config<F>(&self, edit: F) -> MarkAlignResult<Arc<InspectionConfig>>
    where
        F: FnOnce(&mut InspectionConfig),
    {
        let mut inner = self.inner.lock();
        let mut next = (*inner.config).clone();
        edit(&mut next);
        next.validate()?;
        inner.config = Arc::new(next);
        Ok(Arc::clone(&inner.config))
    }

    pub fn snapshot(&self) -> Snapshot {
        let inner = self.inner.lock();
        Snapshot {
            frame: inner.frame.clone(),
            config: Arc::clone(&inner.config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SharedState;
    use crate::config::InspectionConfig;
    use crate::image::{Frame, OwnedImage};
    use std::sync::Arc;

    fn frame(value: u8) -> Frame {
        Frame::from_gray(OwnedImage::filled(2, 2, value).unwrap())
    }

    #[test]
    fn snapshot_survives_frame_replacement() {
        let state = SharedState::new(InspectionConfig::default());
        assert!(state.snapshot().frame.is_none());
        state.replace_frame(frame(1));
        let snap = state.snapshot();
        let previous = state.replace_frame(frame(2)).unwrap();
        assert!(Arc::ptr_eq(&previous, snap.frame.as_ref().unwrap()));
        assert_eq!(snap.frame.unwrap().data()[0], 1);
        assert_eq!(state.frame().unwrap().data()[0], 2);
    }

    #[test]
    fn invalid_config_keeps_previous() {
        let state = SharedState::new(InspectionConfig::default());
        let mut bad = InspectionConfig::default();
        bad.grid.rows = 0;
        assert!(state.set_config(bad).is_err());
        assert_eq!(state.config().grid.rows, 4);
        assert!(state.update_config(|cfg| cfg.grid.columns = 0).is_err());
        assert_eq!(state.config().grid.columns, 5);
        let updated = state.update_config(|cfg| cfg.grid.rows = 2).unwrap();
        assert_eq!(updated.grid.rows, 2);
    }
}
