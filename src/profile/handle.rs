//! Atomic profile handoff between the editing side and the polling loop.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use super::Profile;

/// Creates a linked writer/reader pair holding `initial`.
#[must_use]
pub fn profile_channel(initial: Profile) -> (ProfileHandle, ProfileSource) {
    let (tx, rx) = watch::channel(Arc::new(initial));
    (ProfileHandle { tx }, ProfileSource { rx })
}

/// Write side. Replacing the profile swaps the whole `Arc`; readers never see
/// a partially edited profile.
#[derive(Debug, Clone)]
pub struct ProfileHandle {
    tx: watch::Sender<Arc<Profile>>,
}

impl ProfileHandle {
    /// Publishes a new active profile. Takes effect at the next tick.
    pub fn replace(&self, profile: Profile) {
        info!("Activating profile '{}'", profile.name);
        self.tx.send_replace(Arc::new(profile));
    }

    /// Copy-on-write edit of the active profile.
    pub fn update(&self, edit: impl FnOnce(&mut Profile)) {
        let mut next = Profile::clone(&self.current());
        edit(&mut next);
        self.tx.send_replace(Arc::new(next));
    }

    #[must_use]
    pub fn current(&self) -> Arc<Profile> {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> ProfileSource {
        ProfileSource { rx: self.tx.subscribe() }
    }
}

/// Read side used by the polling loop.
#[derive(Debug, Clone)]
pub struct ProfileSource {
    rx: watch::Receiver<Arc<Profile>>,
}

impl ProfileSource {
    /// The profile to run this tick against.
    #[must_use]
    pub fn current(&self) -> Arc<Profile> {
        self.rx.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::PollingRate;

    #[test]
    fn test_replace_is_seen_by_source() {
        let (handle, source) = profile_channel(Profile::default());
        let before = source.current();

        handle.replace(Profile {
            name: "Racing".into(),
            ..Profile::default()
        });

        let after = source.current();
        assert_eq!(after.name, "Racing");
        assert!(!Arc::ptr_eq(&before, &after));
        // The old snapshot is untouched
        assert_eq!(before.name, "Default");
    }

    #[test]
    fn test_update_copies_on_write() {
        let (handle, source) = profile_channel(Profile::default());
        let held = source.current();

        handle.update(|p| p.polling_rate = PollingRate::Hz250);

        assert_eq!(held.polling_rate, PollingRate::Hz1000);
        assert_eq!(source.current().polling_rate, PollingRate::Hz250);
    }

    #[test]
    fn test_unchanged_profile_keeps_identity() {
        let (_handle, source) = profile_channel(Profile::default());
        assert!(Arc::ptr_eq(&source.current(), &source.current()));
    }

    #[test]
    fn test_subscribe_creates_reader() {
        let (handle, _source) = profile_channel(Profile::default());
        let extra = handle.subscribe();
        handle.update(|p| p.name = "New".into());
        assert_eq!(extra.current().name, "New");
    }
}
