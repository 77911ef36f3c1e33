//! Production event source backed by the fence BPF program.
//!
//! Loads `fence.bpf.c`, attaches the LSM hook and the open tracepoints, and
//! reads `event_t` records from the ring buffer. Only available when the
//! `bpf` feature is enabled.

use std::collections::VecDeque;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use fence_schema::{ActorId, Event};
use libbpf_rs::skel::{OpenSkel, SkelBuilder};
use libbpf_rs::{Link, MapCore, MapFlags, OpenObject, RingBuffer, RingBufferBuilder};

use crate::cancel::CancelToken;
use crate::record::{decode_record, RecordError};
use crate::source::{BpfError, EventSource, SourceError};

mod fence_skel {
    include!(concat!(env!("OUT_DIR"), "/fence.skel.rs"));
}

use fence_skel::*;

/// Longest a single ring buffer poll may block before the cancellation
/// token is checked again.
const POLL_SLICE: Duration = Duration::from_millis(100);

type Pending = Arc<Mutex<VecDeque<Result<Event, RecordError>>>>;

/// Event source that owns the loaded BPF program.
///
/// Dropping the source (or calling `close`) detaches every program.
pub struct BpfEventSource<'obj> {
    skel: FenceSkel<'obj>,
    ring: RingBuffer<'static>,
    pending: Pending,
    links: Mutex<Vec<Link>>,
    closed: AtomicBool,
    warnings: Vec<String>,
}

impl<'obj> BpfEventSource<'obj> {
    /// Load the program into the kernel and attach it.
    ///
    /// The LSM hook and the openat tracepoint are required. The openat2
    /// tracepoint is attached best effort (older kernels lack it); a failure
    /// is recorded in [`BpfEventSource::warnings`].
    ///
    /// # Errors
    /// Returns `BpfError` if:
    /// - the process is not running as root
    /// - the program fails to load (missing BTF, LSM not enabled, ...)
    /// - a required attachment fails
    pub fn new(open_object: &'obj mut MaybeUninit<OpenObject>) -> Result<Self, BpfError> {
        if !nix::unistd::geteuid().is_root() {
            return Err(BpfError::InsufficientPermissions);
        }

        let open_skel = FenceSkelBuilder::default()
            .open(open_object)
            .map_err(|e| BpfError::Load(e.to_string()))?;
        let skel = open_skel.load().map_err(load_error)?;

        let mut links = Vec::with_capacity(3);
        links.push(
            skel.progs
                .deny_file_open
                .attach_lsm()
                .map_err(|e| attach_error("lsm/file_open", e))?,
        );
        links.push(
            skel.progs
                .trace_openat
                .attach()
                .map_err(|e| attach_error("tracepoint/syscalls/sys_enter_openat", e))?,
        );

        let mut warnings = Vec::new();
        match skel.progs.trace_openat2.attach() {
            Ok(link) => links.push(link),
            Err(e) => warnings.push(format!("could not attach openat2 tracepoint: {}", e)),
        }

        let pending: Pending = Arc::default();
        let sink = Arc::clone(&pending);
        let mut builder = RingBufferBuilder::new();
        builder
            .add(&skel.maps.events, move |data: &[u8]| {
                sink.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push_back(decode_record(data));
                0
            })
            .map_err(|e| BpfError::RingBuffer(e.to_string()))?;
        let ring = builder
            .build()
            .map_err(|e| BpfError::RingBuffer(e.to_string()))?;

        Ok(Self {
            skel,
            ring,
            pending,
            links: Mutex::new(links),
            closed: AtomicBool::new(false),
            warnings,
        })
    }

    /// Non-fatal problems hit while attaching.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn ensure_open(&self) -> Result<(), SourceError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SourceError::Closed);
        }
        Ok(())
    }

    fn pop_pending(&self) -> Option<Result<Event, RecordError>> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    fn links(&self) -> MutexGuard<'_, Vec<Link>> {
        self.links.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSource for BpfEventSource<'_> {
    fn next(&self, cancel: &CancelToken) -> Result<Event, SourceError> {
        loop {
            self.ensure_open()?;
            if cancel.is_cancelled() {
                return Err(SourceError::Cancelled);
            }
            if let Some(record) = self.pop_pending() {
                return record.map_err(SourceError::from);
            }
            self.ring
                .poll(POLL_SLICE)
                .map_err(|e| SourceError::Read(e.to_string()))?;
        }
    }

    fn block(&self, pid: ActorId) -> Result<(), SourceError> {
        self.ensure_open()?;
        self.skel
            .maps
            .blocked_pids
            .update(&pid.to_ne_bytes(), &[1u8], MapFlags::ANY)
            .map_err(|e| SourceError::Block {
                pid,
                reason: e.to_string(),
            })
    }

    fn close(&self) -> Result<(), SourceError> {
        self.closed.store(true, Ordering::SeqCst);
        self.links().clear();
        Ok(())
    }
}

fn load_error(e: libbpf_rs::Error) -> BpfError {
    let msg = e.to_string();
    if msg.contains("EPERM") || msg.contains("Operation not permitted") {
        BpfError::InsufficientPermissions
    } else {
        BpfError::Load(msg)
    }
}

fn attach_error(program: &str, e: libbpf_rs::Error) -> BpfError {
    BpfError::Attach {
        program: program.to_string(),
        reason: e.to_string(),
    }
}
