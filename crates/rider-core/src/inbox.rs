//! Chat inbox and unread badge.

use rider_proto::{ThreadId, inbox::InboxThread};

use crate::{error::LookupError, sync::FetchGate};

/// Number shown on the inbox badge before it saturates.
pub const BADGE_LIMIT: u32 = 9;

/// Aggregate unread indicator: the number of threads with unread messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Badge {
    number: u32,
}

impl Badge {
    /// Badge for `number` unread threads.
    pub const fn new(number: u32) -> Self {
        Self { number }
    }

    /// Threads with unread messages.
    pub const fn number(self) -> u32 {
        self.number
    }

    /// Whether the badge is visible.
    pub const fn show(self) -> bool {
        self.number > 0
    }

    /// Text on the badge: the number up to [`BADGE_LIMIT`], then `"9+"`.
    pub fn label(self) -> String {
        if self.number > BADGE_LIMIT { format!("{BADGE_LIMIT}+") } else { self.number.to_string() }
    }

    fn decrement(&mut self) {
        self.number = self.number.saturating_sub(1);
    }
}

/// Thread list as it was before an optimistic delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxSnapshot {
    threads: Vec<InboxThread>,
    badge: Badge,
}

/// The rider's chat threads.
///
/// Invariant: `badge().number()` equals the number of threads whose rider
/// unread count is non-zero.
#[derive(Debug, Clone, Default)]
pub struct Inbox {
    threads: Vec<InboxThread>,
    badge: Badge,
    error: Option<String>,
    gate: FetchGate,
}

impl Inbox {
    /// Empty inbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Threads in server order.
    pub fn threads(&self) -> &[InboxThread] {
        &self.threads
    }

    /// Thread by id.
    pub fn get(&self, id: &ThreadId) -> Option<&InboxThread> {
        self.threads.iter().find(|t| &t.id == id)
    }

    /// Unread badge.
    pub fn badge(&self) -> Badge {
        self.badge
    }

    /// Inline error of the last failed refresh.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Record a refresh failure.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Single-flight guard for `refresh`.
    pub fn gate(&mut self) -> &mut FetchGate {
        &mut self.gate
    }

    /// Replace every thread and recount the badge.
    pub fn replace(&mut self, threads: Vec<InboxThread>) {
        self.threads = threads;
        self.badge = Badge::new(count_unread(&self.threads));
        self.error = None;
    }

    /// Zero the thread's unread count. The badge drops by one if the thread
    /// had anything unread, regardless of how much.
    ///
    /// Returns whether anything was unread.
    ///
    /// # Errors
    ///
    /// [`LookupError::Thread`] for unknown ids.
    pub fn open_thread(&mut self, id: &ThreadId) -> Result<bool, LookupError> {
        let thread = self
            .threads
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| LookupError::Thread(id.clone()))?;
        let had_unread = thread.has_unread();
        thread.unread_count.rider = Some(0);
        if had_unread {
            self.badge.decrement();
        }
        Ok(had_unread)
    }

    /// Optimistically remove a thread. Returns the pre-removal snapshot.
    ///
    /// # Errors
    ///
    /// [`LookupError::Thread`] for unknown ids.
    pub fn remove(&mut self, id: &ThreadId) -> Result<InboxSnapshot, LookupError> {
        let pos = self
            .threads
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| LookupError::Thread(id.clone()))?;
        let snapshot = InboxSnapshot { threads: self.threads.clone(), badge: self.badge };
        let removed = self.threads.remove(pos);
        if removed.has_unread() {
            self.badge.decrement();
        }
        Ok(snapshot)
    }

    /// Put back a captured thread list and its badge.
    pub fn restore(&mut self, snapshot: InboxSnapshot) {
        self.threads = snapshot.threads;
        self.badge = snapshot.badge;
    }

    /// Drop everything, e.g. on logout.
    pub fn clear(&mut self) {
        self.threads.clear();
        self.badge = Badge::default();
        self.error = None;
        self.gate.reset();
    }
}

/// Number of threads with unread rider messages.
pub fn count_unread(threads: &[InboxThread]) -> u32 {
    threads.iter().filter(|t| t.has_unread()).count() as u32
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rider_proto::inbox::UnreadCount;

    use super::*;

    fn thread(id: &str, unread: Option<u32>) -> InboxThread {
        InboxThread {
            id: ThreadId::new(id),
            participants: Vec::new(),
            last_message: String::new(),
            last_sender: None,
            updated_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            unread_count: UnreadCount { rider: unread },
        }
    }

    #[test]
    fn badge_counts_threads_not_messages() {
        let mut inbox = Inbox::new();
        inbox.replace(vec![
            thread("a", Some(2)),
            thread("b", Some(0)),
            thread("c", None),
            thread("d", Some(1)),
            thread("e", Some(0)),
        ]);

        assert_eq!(inbox.badge().number(), 2);
        assert!(inbox.badge().show());
    }

    #[test]
    fn badge_label_saturates() {
        insta::assert_snapshot!(Badge::new(9).label(), @"9");
        insta::assert_snapshot!(Badge::new(10).label(), @"9+");
        assert!(!Badge::new(0).show());
    }

    #[test]
    fn opening_thread_decrements_by_one() {
        let mut inbox = Inbox::new();
        inbox.replace(vec![thread("a", Some(5)), thread("b", Some(1))]);

        assert!(inbox.open_thread(&ThreadId::new("a")).unwrap());
        assert_eq!(inbox.badge().number(), 1);
        assert_eq!(inbox.get(&ThreadId::new("a")).unwrap().unread_for_rider(), 0);

        // Already read: no change
        assert!(!inbox.open_thread(&ThreadId::new("a")).unwrap());
        assert_eq!(inbox.badge().number(), 1);
    }

    #[test]
    fn remove_and_restore() {
        let mut inbox = Inbox::new();
        inbox.replace(vec![thread("a", Some(1)), thread("b", None)]);

        let snapshot = inbox.remove(&ThreadId::new("a")).unwrap();
        assert_eq!(inbox.threads().len(), 1);
        assert_eq!(inbox.badge().number(), 0);

        inbox.restore(snapshot);
        assert_eq!(inbox.threads().len(), 2);
        assert_eq!(inbox.badge().number(), 1);
    }

    #[test]
    fn unknown_thread() {
        let mut inbox = Inbox::new();
        assert_eq!(
            inbox.open_thread(&ThreadId::new("x")),
            Err(LookupError::Thread(ThreadId::new("x")))
        );
    }
}
