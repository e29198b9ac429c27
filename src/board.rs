//! Doctor-side status board.
//!
//! Holds one doctor's appointment list, buckets it into the four
//! lifecycle categories, and issues status transitions. The board owns
//! a revisioned snapshot: every local transition bumps the revision, and
//! a refresh whose fetch started before the last transition is discarded
//! instead of overwriting the newer local state. The next refresh
//! reconciles with the server, which stays the source of truth.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use crate::client::{self, ApiClient, ApiError};
use crate::models::{Appointment, Status};

/// Background refresh period while the board is on screen.
pub const REFRESH_INTERVAL_SECS: u64 = 30;

/// Sleep granularity for shutdown responsiveness.
const SLEEP_GRANULARITY_SECS: u64 = 1;

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("appointment {0} is not on the board")]
    UnknownAppointment(String),
    #[error("{transition} is not offered while the appointment is {status}")]
    TransitionNotOffered { transition: Transition, status: Status },
    #[error("internal lock error")]
    LockPoisoned,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The three doctor actions. From the doctor's point of view the machine
/// is: pending → accepted or rejected, accepted → completed; rejected and
/// completed are terminal. Skipping straight from pending to completed is
/// a client-side restriction, not a backend rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Accept,
    Reject,
    Complete,
}

impl Transition {
    /// Status written to the backend when this transition applies.
    pub fn target(self) -> Status {
        match self {
            Transition::Accept => Status::Accepted,
            Transition::Reject => Status::Rejected,
            Transition::Complete => Status::Completed,
        }
    }

    /// Whether the board offers this transition from `from`.
    pub fn offered_from(self, from: Status) -> bool {
        matches!(
            (from, self),
            (Status::Pending, Transition::Accept)
                | (Status::Pending, Transition::Reject)
                | (Status::Accepted, Transition::Complete)
        )
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Transition::Accept => "accept",
            Transition::Reject => "reject",
            Transition::Complete => "complete",
        })
    }
}

/// The four lifecycle buckets. An appointment sits in exactly one,
/// per its current mapped status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buckets {
    pub pending: Vec<Appointment>,
    pub accepted: Vec<Appointment>,
    pub rejected: Vec<Appointment>,
    pub completed: Vec<Appointment>,
}

impl Buckets {
    pub fn counts(&self) -> BucketCounts {
        BucketCounts {
            pending: self.pending.len(),
            accepted: self.accepted.len(),
            rejected: self.rejected.len(),
            completed: self.completed.len(),
        }
    }
}

/// Summary counters driving the board header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketCounts {
    pub pending: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub completed: usize,
}

struct BoardState {
    appointments: Vec<Appointment>,
    /// Bumped on every local mutation; lets a refresh detect that its
    /// snapshot predates a newer local write.
    revision: u64,
}

pub struct StatusBoard {
    client: Arc<ApiClient>,
    doctor_id: String,
    state: Mutex<BoardState>,
}

impl StatusBoard {
    pub fn new(client: Arc<ApiClient>, doctor_id: &str) -> Self {
        Self {
            client,
            doctor_id: doctor_id.to_string(),
            state: Mutex::new(BoardState {
                appointments: Vec::new(),
                revision: 0,
            }),
        }
    }

    pub fn doctor_id(&self) -> &str {
        &self.doctor_id
    }

    /// Fetch the doctor's appointments and install the snapshot.
    /// The response may be a bare array or wrapped in one of a few
    /// envelopes; anything unrecognizable normalizes to empty.
    pub fn refresh(&self) -> Result<(), BoardError> {
        let seen_revision = self.state()?.revision;

        let path = format!("/api/appointments/doctor/{}", self.doctor_id);
        let response = self.client.get(&path)?;
        let fetched: Vec<Appointment> = response
            .json()
            .and_then(|payload| {
                client::list_under(&payload, &["", "data", "appointments", "data.appointments"])
            })
            .unwrap_or_default();

        self.install(fetched, seen_revision)
    }

    /// All appointments in the current snapshot.
    pub fn appointments(&self) -> Result<Vec<Appointment>, BoardError> {
        Ok(self.state()?.appointments.clone())
    }

    /// Partition the snapshot by mapped status.
    pub fn buckets(&self) -> Result<Buckets, BoardError> {
        let state = self.state()?;
        let mut buckets = Buckets::default();
        for appointment in &state.appointments {
            let bucket = match appointment.mapped_status() {
                Status::Pending => &mut buckets.pending,
                Status::Accepted => &mut buckets.accepted,
                Status::Rejected => &mut buckets.rejected,
                Status::Completed => &mut buckets.completed,
            };
            bucket.push(appointment.clone());
        }
        Ok(buckets)
    }

    pub fn counts(&self) -> Result<BucketCounts, BoardError> {
        Ok(self.buckets()?.counts())
    }

    pub fn accept(&self, appointment_id: &str) -> Result<(), BoardError> {
        self.transition(appointment_id, Transition::Accept)
    }

    pub fn reject(&self, appointment_id: &str) -> Result<(), BoardError> {
        self.transition(appointment_id, Transition::Reject)
    }

    pub fn complete(&self, appointment_id: &str) -> Result<(), BoardError> {
        self.transition(appointment_id, Transition::Complete)
    }

    /// Apply one transition: a single PUT with the backend status, then
    /// an optimistic local update so the buckets reflect the change
    /// without a re-fetch. On failure the local record is untouched.
    pub fn transition(
        &self,
        appointment_id: &str,
        transition: Transition,
    ) -> Result<(), BoardError> {
        let current = {
            let state = self.state()?;
            let appointment = state
                .appointments
                .iter()
                .find(|a| a.id == appointment_id)
                .ok_or_else(|| BoardError::UnknownAppointment(appointment_id.to_string()))?;
            appointment.mapped_status()
        };

        if !transition.offered_from(current) {
            return Err(BoardError::TransitionNotOffered {
                transition,
                status: current,
            });
        }

        let target = transition.target();
        let body = serde_json::json!({ "status": target.to_backend() });
        let path = format!("/api/appointments/{appointment_id}");
        self.client.put(&path, &body)?;

        let mut state = self.state()?;
        if let Some(appointment) = state
            .appointments
            .iter_mut()
            .find(|a| a.id == appointment_id)
        {
            appointment.status = target.to_backend().to_string();
        }
        state.revision += 1;
        tracing::info!(id = appointment_id, status = %target, "appointment status updated");
        Ok(())
    }

    /// Install a fetched snapshot unless a local write happened after the
    /// fetch started; a stale snapshot is dropped and the next refresh
    /// brings the board back in line with the server.
    fn install(
        &self,
        fetched: Vec<Appointment>,
        seen_revision: u64,
    ) -> Result<(), BoardError> {
        let mut state = self.state()?;
        if state.revision != seen_revision {
            tracing::debug!(
                doctor_id = %self.doctor_id,
                "discarding stale snapshot fetched before a local update"
            );
            return Ok(());
        }
        state.appointments = fetched;
        Ok(())
    }

    fn state(&self) -> Result<MutexGuard<'_, BoardState>, BoardError> {
        self.state.lock().map_err(|_| BoardError::LockPoisoned)
    }
}

// ─── Background refresher ─────────────────────────────────────────────────────

/// Periodic refresh while the board is on screen. Torn down on drop
/// (atomic flag plus join), so dropping the refresher when the doctor
/// signs out or the view unmounts cancels the interval. Refresh failures
/// are logged and retried on the next tick.
pub struct BoardRefresher {
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl BoardRefresher {
    pub fn start(board: Arc<StatusBoard>) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();

        let handle = thread::spawn(move || {
            tracing::info!(
                doctor_id = %board.doctor_id(),
                "board refresher started (every {REFRESH_INTERVAL_SECS}s)"
            );
            refresh_loop(&board, &flag);
        });

        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    /// Request shutdown without waiting for the thread.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl Drop for BoardRefresher {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn refresh_loop(board: &StatusBoard, shutdown: &AtomicBool) {
    while !shutdown.load(Ordering::Relaxed) {
        // Sleep in small increments for responsive teardown.
        for _ in 0..(REFRESH_INTERVAL_SECS / SLEEP_GRANULARITY_SECS) {
            if shutdown.load(Ordering::Relaxed) {
                tracing::info!("board refresher shutting down");
                return;
            }
            thread::sleep(Duration::from_secs(SLEEP_GRANULARITY_SECS));
        }

        if let Err(e) = board.refresh() {
            tracing::warn!(error = %e, "background board refresh failed");
        }
    }
    tracing::info!("board refresher shutting down");
}
