//! The stress harness: races concurrent appenders against a chosen
//! container variant and verifies what survived.
//!
//! Hazards the container exhibits (size mismatches, lost values, caught
//! bounds violations) are observations and land in the
//! [`StressReport`]; only faults of the harness itself (timeouts,
//! poisoned locks, dead workers) are errors.

use {
    crate::{
        CowVec, LockedVec, RacyVec,
        error::{AppendError, HarnessError},
        stamp::Stamp,
    },
    std::{
        fmt,
        str::FromStr,
        sync::{Arc, mpsc},
        thread,
        time::{Duration, Instant},
    },
    tracing::{debug, info, warn},
};

/// Which container to run the appenders against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// [`RacyVec`]: no synchronization, races expected.
    Unsafe,
    /// [`LockedVec`]: one coarse lock around every operation.
    Synchronized,
    /// [`CowVec`]: immutable snapshots, atomic publication.
    CopyOnWrite,
}

impl Variant {
    pub const ALL: [Self; 3] =
        [Self::Unsafe, Self::Synchronized, Self::CopyOnWrite];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unsafe => "unsafe",
            Self::Synchronized => "synchronized",
            Self::CopyOnWrite => "copy-on-write",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
impl FromStr for Variant {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unsafe" => Ok(Self::Unsafe),
            "synchronized" => Ok(Self::Synchronized),
            "copy-on-write" => Ok(Self::CopyOnWrite),
            _ => Err(format!(
                "unknown variant `{s}` (expected `unsafe`, `synchronized` \
                 or `copy-on-write`)"
            )),
        }
    }
}

/// What the harness needs from a container variant.
///
/// Implementations are shared across worker threads by reference; whether
/// an append is atomic with respect to other appends is exactly the
/// property under test.
pub trait AppendTarget: Send + Sync {
    /// Places one stamped value at the next free slot.
    ///
    /// # Errors
    /// [`AppendError::Bounds`] is a recorded hazard; anything else is
    /// fatal to the run.
    fn append(&self, stamp: u64) -> Result<(), AppendError>;
    /// Current element count.
    fn size(&self) -> usize;
    /// Copies the stored values out for reconciliation. Called only after
    /// all appenders have quiesced.
    fn values(&self) -> Vec<u64>;
}

impl AppendTarget for RacyVec {
    fn append(&self, stamp: u64) -> Result<(), AppendError> {
        RacyVec::append(self, stamp)?;
        Ok(())
    }
    fn size(&self) -> usize {
        self.len()
    }
    fn values(&self) -> Vec<u64> {
        RacyVec::values(self)
    }
}
impl AppendTarget for LockedVec<u64> {
    fn append(&self, stamp: u64) -> Result<(), AppendError> {
        let mut guard = self.lock().map_err(|_| AppendError::Poisoned)?;
        guard.push(stamp);
        Ok(())
    }
    fn size(&self) -> usize {
        self.len()
    }
    fn values(&self) -> Vec<u64> {
        self.to_vec()
    }
}
impl AppendTarget for CowVec<u64> {
    fn append(&self, stamp: u64) -> Result<(), AppendError> {
        self.push(stamp);
        Ok(())
    }
    fn size(&self) -> usize {
        self.len()
    }
    fn values(&self) -> Vec<u64> {
        self.snapshot().as_ref().clone()
    }
}

/// Parameters of one stress run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StressConfig {
    pub variant: Variant,
    pub threads: usize,
    pub ops_per_thread: usize,
    /// How long to wait for the workers before reporting the run as
    /// incomplete instead of hanging.
    pub timeout: Duration,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            variant: Variant::Unsafe,
            threads: 2,
            ops_per_thread: 10_000,
            timeout: Duration::from_secs(30),
        }
    }
}

impl StressConfig {
    /// `threads * ops_per_thread`, the size every run should end at.
    #[inline]
    #[must_use]
    pub const fn expected(&self) -> usize {
        self.threads * self.ops_per_thread
    }

    fn checked_counts(&self) -> Result<(u32, u32), HarnessError> {
        if self.threads == 0 {
            return Err(HarnessError::InvalidConfig(
                "thread count must be at least 1",
            ));
        }
        if self.ops_per_thread == 0 {
            return Err(HarnessError::InvalidConfig(
                "ops per thread must be at least 1",
            ));
        }
        let Ok(threads) = u32::try_from(self.threads) else {
            return Err(HarnessError::InvalidConfig(
                "thread count must fit in a stamp (32 bits)",
            ));
        };
        if threads == u32::MAX {
            return Err(HarnessError::InvalidConfig(
                "thread count must be below 2^32 - 1",
            ));
        }
        let Ok(ops) = u32::try_from(self.ops_per_thread) else {
            return Err(HarnessError::InvalidConfig(
                "ops per thread must fit in a stamp (32 bits)",
            ));
        };
        if self.threads.checked_mul(self.ops_per_thread).is_none() {
            return Err(HarnessError::InvalidConfig(
                "threads * ops_per_thread overflows",
            ));
        }
        Ok((threads, ops))
    }
}

/// What one worker thread saw.
#[derive(Debug, Clone, Copy)]
struct WorkerOutcome {
    thread: u32,
    appended: usize,
    bounds_errors: usize,
}

/// Outcome of one stress run.
///
/// `matched` is the safe-variant invariant: observed size equals expected
/// size and the reconciliation pass found every stamp exactly once with
/// nothing extra and no caught bounds errors. For the unsafe variant a
/// `matched == false` report is the documented, expected outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StressReport {
    pub variant: Variant,
    pub threads: usize,
    pub ops_per_thread: usize,
    pub expected: usize,
    pub observed: usize,
    /// Out-of-bounds appends caught and recorded by the workers.
    pub bounds_errors: usize,
    /// Expected stamps the reconciliation pass never found (lost updates).
    pub missing: usize,
    /// Stamps found more than once.
    pub duplicates: usize,
    /// Values that decode to no expected stamp.
    pub unexpected: usize,
    pub matched: bool,
}

impl StressReport {
    #[inline]
    #[must_use]
    pub const fn race_detected(&self) -> bool {
        !self.matched
    }
}

impl fmt::Display for StressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "variant:           {}", self.variant)?;
        writeln!(f, "threads:           {}", self.threads)?;
        writeln!(f, "ops per thread:    {}", self.ops_per_thread)?;
        writeln!(f, "expected size:     {}", self.expected)?;
        writeln!(f, "observed size:     {}", self.observed)?;
        writeln!(f, "bounds errors:     {}", self.bounds_errors)?;
        writeln!(f, "missing values:    {}", self.missing)?;
        writeln!(f, "duplicate values:  {}", self.duplicates)?;
        writeln!(f, "unexpected values: {}", self.unexpected)?;
        write!(
            f,
            "result:            {}",
            if self.matched { "match" } else { "race detected" }
        )
    }
}

/// Runs `threads` concurrent appenders, each performing `ops_per_thread`
/// sequential appends of stamped values, against the configured variant.
///
/// Waits for every worker up to the configured timeout, then reads the
/// final size once and reconciles the stored values against the full set
/// of expected stamps.
///
/// # Errors
/// Only harness faults: invalid configuration, a poisoned lock, a worker
/// that timed out or died. A detected race is reported, not an error.
///
/// # Examples
/// ```
/// use {
///     racevec::stress::{self, StressConfig, Variant},
///     std::time::Duration,
/// };
///
/// let report = stress::run(&StressConfig {
///     variant: Variant::Synchronized,
///     threads: 2,
///     ops_per_thread: 100,
///     timeout: Duration::from_secs(10),
/// })
/// .unwrap();
/// assert!(report.matched);
/// assert_eq!(report.observed, 200);
/// ```
pub fn run(config: &StressConfig) -> Result<StressReport, HarnessError> {
    let (threads, ops) = config.checked_counts()?;
    info!(
        variant = %config.variant,
        threads,
        ops_per_thread = ops,
        "starting stress run"
    );

    let target: Arc<dyn AppendTarget> = match config.variant {
        Variant::Unsafe => Arc::new(RacyVec::new()),
        Variant::Synchronized => Arc::new(LockedVec::<u64>::new()),
        Variant::CopyOnWrite => Arc::new(CowVec::<u64>::new()),
    };

    let (tx, rx) = mpsc::channel();
    let mut handles = Vec::with_capacity(threads as usize);
    for thread_id in 0..threads {
        let target = Arc::clone(&target);
        let tx = tx.clone();
        handles.push(thread::spawn(move || {
            worker(thread_id, ops, &*target, &tx);
        }));
    }
    drop(tx);

    let deadline = Instant::now() + config.timeout;
    let mut outcomes = Vec::with_capacity(threads as usize);
    while outcomes.len() < threads as usize {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(Ok(outcome)) => outcomes.push(outcome),
            Ok(Err(fault)) => return Err(fault),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(timeout = ?config.timeout, "workers missed the deadline");
                return Err(HarnessError::WorkerTimeout(config.timeout));
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(HarnessError::WorkerPanicked);
            }
        }
    }
    for handle in handles {
        // Every worker has reported, so these joins do not block.
        if handle.join().is_err() {
            return Err(HarnessError::WorkerPanicked);
        }
    }

    let observed = target.size();
    let bounds_errors = outcomes.iter().map(|o| o.bounds_errors).sum();
    let recon = reconcile(&target.values(), threads, ops);

    let expected = threads as usize * ops as usize;
    let matched = observed == expected
        && bounds_errors == 0
        && recon.missing == 0
        && recon.duplicates == 0
        && recon.unexpected == 0;
    let report = StressReport {
        variant: config.variant,
        threads: threads as usize,
        ops_per_thread: ops as usize,
        expected,
        observed,
        bounds_errors,
        missing: recon.missing,
        duplicates: recon.duplicates,
        unexpected: recon.unexpected,
        matched,
    };
    if report.race_detected() {
        warn!(
            variant = %report.variant,
            observed = report.observed,
            expected = report.expected,
            missing = report.missing,
            bounds_errors = report.bounds_errors,
            "race detected"
        );
    } else {
        info!(variant = %report.variant, observed = report.observed, "run matched");
    }
    Ok(report)
}

/// One appender: `ops` sequential appends of this thread's stamps.
/// Bounds violations are recorded and the worker keeps going; observing
/// hazards is its job, dying on them is not.
fn worker(
    thread_id: u32,
    ops: u32,
    target: &dyn AppendTarget,
    tx: &mpsc::Sender<Result<WorkerOutcome, HarnessError>>,
) {
    let mut outcome = WorkerOutcome {
        thread: thread_id,
        appended: 0,
        bounds_errors: 0,
    };
    for seq in 0..ops {
        match target.append(Stamp::new(thread_id, seq).pack()) {
            Ok(()) => outcome.appended += 1,
            Err(AppendError::Bounds(e)) => {
                outcome.bounds_errors += 1;
                debug!(thread = thread_id, error = %e, "caught bounds violation");
            }
            Err(AppendError::Poisoned) => {
                let _ = tx.send(Err(HarnessError::LockPoisoned));
                return;
            }
        }
    }
    debug!(
        thread = outcome.thread,
        appended = outcome.appended,
        bounds_errors = outcome.bounds_errors,
        "worker finished"
    );
    let _ = tx.send(Ok(outcome));
}

struct Reconciliation {
    missing: usize,
    duplicates: usize,
    unexpected: usize,
}

/// Checks that every expected (thread, seq) stamp appears exactly once in
/// what the container retained.
fn reconcile(values: &[u64], threads: u32, ops: u32) -> Reconciliation {
    let expected = threads as usize * ops as usize;
    let mut seen = vec![false; expected];
    let mut duplicates = 0;
    let mut unexpected = 0;
    for &raw in values {
        match Stamp::unpack(raw) {
            Some(stamp) if stamp.thread < threads && stamp.seq < ops => {
                let idx =
                    stamp.thread as usize * ops as usize + stamp.seq as usize;
                if seen[idx] {
                    duplicates += 1;
                } else {
                    seen[idx] = true;
                }
            }
            _ => unexpected += 1,
        }
    }
    let found = seen.iter().filter(|&&s| s).count();
    Reconciliation {
        missing: expected - found,
        duplicates,
        unexpected,
    }
}
