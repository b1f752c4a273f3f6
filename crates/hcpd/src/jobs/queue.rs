//! FIFO job queue shared between listener threads and the frame loop.
//!
//! Listener threads append through a [`JobSender`]. The tree-owning thread
//! holds the only [`JobPump`]; it peeks the head, runs it with the lock
//! released, then pops it. No request code ever runs under the queue lock.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hcp_scene::{ReflectionTable, SceneTree};
use tracing::{debug, warn};

use super::JOBS_TARGET;
use super::job::{Job, JobId, JobReport, JobState, JobTicket};
use crate::dispatch::{ActionRequest, ExecutionContext, JobResponse};
use crate::element::ElementRegistry;
use crate::health::HealthReporter;

#[derive(Default)]
struct Shared {
    jobs: Mutex<VecDeque<Job>>,
    next_id: AtomicU64,
    // Both flags are written and read only while `jobs` is locked.
    closed: AtomicBool,
    suspended: AtomicBool,
}

impl Shared {
    // Only queue bookkeeping happens under the lock, so a poisoned queue is
    // still consistent.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Job>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Creates a connected sender and pump.
#[must_use]
pub fn job_queue(reflection: ReflectionTable) -> (JobSender, JobPump) {
    let shared = Arc::new(Shared::default());
    let sender = JobSender {
        shared: Arc::clone(&shared),
    };
    let pump = JobPump {
        shared,
        registry: ElementRegistry::new(),
        reflection,
        strict_selectors: false,
        reporter: None,
    };
    (sender, pump)
}

/// Producer handle; cheap to clone into each connection thread.
#[derive(Clone)]
pub struct JobSender {
    shared: Arc<Shared>,
}

impl JobSender {
    /// Appends a job in state `QUEUED` and returns its ticket.
    ///
    /// Once the pump is gone, or while the queue is suspended, the job is
    /// dropped straight away and the ticket reports it abandoned.
    #[must_use]
    pub fn submit(&self, request: ActionRequest) -> JobTicket {
        let id = JobId::new(self.shared.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let action = request.action();
        let (job, ticket) = Job::new(id, request);
        let mut jobs = self.shared.lock();
        if self.shared.closed.load(Ordering::SeqCst) {
            debug!(target: JOBS_TARGET, job = %id, action, "pump gone; job abandoned");
            return ticket;
        }
        if self.shared.suspended.load(Ordering::SeqCst) {
            debug!(target: JOBS_TARGET, job = %id, action, "queue suspended; job abandoned");
            return ticket;
        }
        jobs.push_back(job);
        drop(jobs);
        debug!(target: JOBS_TARGET, job = %id, action, "job queued");
        ticket
    }

    /// Jobs waiting or running.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.lock().len()
    }

    /// True when no job is waiting or running.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Abandons every queued job and rejects new ones until [`resume`].
    ///
    /// Waiting tickets resolve to [`JobError::Abandoned`] at once, so
    /// connection threads blocked on them can finish. A job the pump is
    /// running completes normally but its result is discarded. Returns the
    /// number of jobs abandoned.
    ///
    /// [`resume`]: Self::resume
    /// [`JobError::Abandoned`]: super::JobError::Abandoned
    pub fn suspend(&self) -> usize {
        let mut jobs = self.shared.lock();
        self.shared.suspended.store(true, Ordering::SeqCst);
        let abandoned = jobs.len();
        jobs.clear();
        abandoned
    }

    /// Accepts submissions again after [`suspend`](Self::suspend).
    pub fn resume(&self) {
        let _jobs = self.shared.lock();
        self.shared.suspended.store(false, Ordering::SeqCst);
    }

    /// Snapshot of every job still in the queue, head first.
    #[must_use]
    pub fn states(&self) -> Vec<(JobId, JobState)> {
        self.shared
            .lock()
            .iter()
            .map(|job| (job.id, job.state))
            .collect()
    }
}

/// Consumer side; lives on the tree-owning thread.
///
/// Dropping the pump abandons every queued job and wakes their waiters with
/// [`JobError::Abandoned`](super::JobError::Abandoned).
pub struct JobPump {
    shared: Arc<Shared>,
    registry: ElementRegistry,
    reflection: ReflectionTable,
    strict_selectors: bool,
    reporter: Option<Arc<dyn HealthReporter>>,
}

impl JobPump {
    /// Fails ambiguous single-element searches instead of taking the first match.
    #[must_use]
    pub fn with_strict_selectors(mut self, strict: bool) -> Self {
        self.strict_selectors = strict;
        self
    }

    /// Routes finished-job events to `reporter`.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn HealthReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Element ids handed out so far.
    #[must_use]
    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    /// Runs at most one job. Call once per frame.
    ///
    /// Registry entries for units destroyed since the last tick are evicted
    /// first. Returns a report for the job that ran, if any.
    pub fn tick(&mut self, tree: &mut dyn SceneTree) -> Option<JobReport> {
        let destroyed = tree.take_destroyed();
        let evicted = self.registry.evict(&destroyed);
        if evicted > 0 {
            debug!(target: JOBS_TARGET, evicted, "evicted destroyed elements");
        }

        let (id, request) = self.begin()?;
        let outcome = self.run(&*tree, &request);
        let (state, response, failure) = match outcome {
            Ok(response) => (JobState::Complete, response, None),
            Err((kind, message)) => {
                let response = JobResponse::error(kind.clone(), message);
                (JobState::Error, response, Some(kind))
            }
        };
        let report = JobReport {
            id,
            action: request.action(),
            state,
            failure,
        };
        self.finish(report, response)
    }

    // Peek the head and mark it PROCESSING. The job stays queued.
    fn begin(&self) -> Option<(JobId, ActionRequest)> {
        let mut jobs = self.shared.lock();
        let head = jobs.front_mut()?;
        head.state = JobState::Processing;
        Some((head.id, head.request.clone()))
    }

    fn run(
        &mut self,
        tree: &dyn SceneTree,
        request: &ActionRequest,
    ) -> Result<JobResponse, (String, String)> {
        let mut context = ExecutionContext::new(tree, &mut self.registry, &self.reflection)
            .with_strict_selectors(self.strict_selectors);
        match panic::catch_unwind(AssertUnwindSafe(|| request.execute(&mut context))) {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(error)) => Err((error.kind().to_owned(), error.to_string())),
            Err(payload) => Err(("InternalError".to_owned(), panic_message(payload.as_ref()))),
        }
    }

    // The head may have been abandoned by `suspend` while it ran, so the job
    // is looked up by id rather than popped blindly.
    fn finish(&mut self, report: JobReport, response: JobResponse) -> Option<JobReport> {
        let job = {
            let mut jobs = self.shared.lock();
            jobs.iter()
                .position(|job| job.id == report.id)
                .and_then(|index| jobs.remove(index))
        };
        match job {
            Some(mut job) => {
                job.state = report.state;
                if !job.complete(response) {
                    debug!(target: JOBS_TARGET, job = %report.id, "waiter gone; result discarded");
                }
            }
            None => {
                debug!(target: JOBS_TARGET, job = %report.id, "job abandoned while running");
            }
        }
        if let Some(reporter) = &self.reporter {
            match report.state {
                JobState::Error => reporter.job_failed(&report),
                _ => reporter.job_completed(&report),
            }
        }
        debug!(
            target: JOBS_TARGET,
            job = %report.id,
            action = report.action,
            state = %report.state,
            "job finished"
        );
        Some(report)
    }
}

impl Drop for JobPump {
    fn drop(&mut self) {
        let mut jobs = self.shared.lock();
        self.shared.closed.store(true, Ordering::SeqCst);
        let abandoned = jobs.len();
        jobs.clear();
        if abandoned > 0 {
            warn!(target: JOBS_TARGET, abandoned, "job pump dropped with queued jobs");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "request execution panicked".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use hcp_scene::{ComponentSpec, Scene, StickyTag};
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;
    use crate::jobs::JobError;

    #[fixture]
    fn scene() -> Scene {
        let mut scene = Scene::default();
        let foo = scene.spawn(None, "Foo").expect("foo");
        scene
            .attach(foo, ComponentSpec::new("Button"))
            .expect("button");
        scene
            .set_sticky(foo, StickyTag::authored("f00"))
            .expect("sticky");
        scene
    }

    fn find(selector: &str) -> ActionRequest {
        ActionRequest::find(&json!({"strategy": "name", "selector": selector}))
            .expect("find request")
    }

    #[test]
    fn idle_ticks_do_nothing() {
        let (_sender, mut pump) = job_queue(ReflectionTable::new());
        let mut scene = Scene::default();
        assert!(pump.tick(&mut scene).is_none());
    }

    #[rstest]
    fn jobs_stay_queued_until_a_tick(mut scene: Scene) {
        let (sender, mut pump) = job_queue(ReflectionTable::new());
        let ticket = sender.submit(find("Foo"));
        assert_eq!(sender.states(), vec![(ticket.id(), JobState::Queued)]);
        assert!(ticket.try_completion().is_none());

        let report = pump.tick(&mut scene).expect("ran a job");
        assert_eq!(report.state, JobState::Complete);
        assert!(sender.is_empty());

        let completion = ticket.wait().expect("completion");
        assert_eq!(completion.state, JobState::Complete);
        assert_eq!(completion.response.to_json(), json!({"ELEMENT": "HCP-f00|Transform"}));
    }

    #[rstest]
    fn one_job_per_tick_in_fifo_order(mut scene: Scene) {
        let (sender, mut pump) = job_queue(ReflectionTable::new());
        let tickets: Vec<_> = ["Foo", "Bar", "Foo"]
            .into_iter()
            .map(|selector| sender.submit(find(selector)))
            .collect();
        let expected: Vec<JobId> = tickets.iter().map(JobTicket::id).collect();

        let mut ran = Vec::new();
        for remaining in (0..3).rev() {
            ran.push(pump.tick(&mut scene).expect("job").id);
            assert_eq!(sender.len(), remaining);
        }
        assert_eq!(ran, expected);
        assert!(pump.tick(&mut scene).is_none());

        let states: Vec<_> = tickets
            .into_iter()
            .map(|ticket| ticket.wait().expect("completion").state)
            .collect();
        assert_eq!(
            states,
            vec![JobState::Complete, JobState::Error, JobState::Complete]
        );
    }

    #[rstest]
    fn failures_become_error_payloads(mut scene: Scene) {
        let (sender, mut pump) = job_queue(ReflectionTable::new());
        let ticket = sender.submit(find("Missing"));
        let report = pump.tick(&mut scene).expect("job");
        assert_eq!(report.failure.as_deref(), Some("ElementNotFound"));

        let completion = ticket.wait().expect("completion");
        assert_eq!(completion.state, JobState::Error);
        assert_eq!(completion.response.to_json()["error"], "ElementNotFound");
    }

    #[rstest]
    fn dropped_waiters_do_not_stall_the_queue(mut scene: Scene) {
        let (sender, mut pump) = job_queue(ReflectionTable::new());
        drop(sender.submit(find("Foo")));
        let ticket = sender.submit(find("Foo"));
        assert!(pump.tick(&mut scene).is_some());
        assert!(pump.tick(&mut scene).is_some());
        assert_eq!(ticket.wait().expect("completion").state, JobState::Complete);
    }

    #[test]
    fn dropping_the_pump_abandons_waiters() {
        let (sender, pump) = job_queue(ReflectionTable::new());
        let ticket = sender.submit(ActionRequest::Source);
        let id = ticket.id();
        drop(pump);
        assert_eq!(ticket.wait(), Err(JobError::Abandoned { id }));
        assert!(sender.is_empty());

        let late = sender.submit(ActionRequest::Source);
        let late_id = late.id();
        assert_eq!(late.wait(), Err(JobError::Abandoned { id: late_id }));
    }

    #[rstest]
    fn suspending_abandons_waiters_until_resumed(mut scene: Scene) {
        let (sender, mut pump) = job_queue(ReflectionTable::new());
        let queued = sender.submit(find("Foo"));
        let queued_id = queued.id();
        assert_eq!(sender.suspend(), 1);
        assert_eq!(queued.wait(), Err(JobError::Abandoned { id: queued_id }));
        assert!(sender.is_empty());

        let rejected = sender.submit(find("Foo"));
        let rejected_id = rejected.id();
        assert_eq!(rejected.wait(), Err(JobError::Abandoned { id: rejected_id }));
        assert!(pump.tick(&mut scene).is_none());

        sender.resume();
        let ticket = sender.submit(find("Foo"));
        assert!(pump.tick(&mut scene).is_some());
        assert_eq!(ticket.wait().expect("completion").state, JobState::Complete);
    }

    #[rstest]
    fn destroyed_units_are_evicted_on_tick(mut scene: Scene) {
        let (sender, mut pump) = job_queue(ReflectionTable::new());
        let ticket = sender.submit(find("Foo"));
        pump.tick(&mut scene);
        ticket.wait().expect("completion");
        assert_eq!(pump.registry().len(), 1);

        let foo = scene.roots()[0];
        scene.destroy(foo).expect("destroy");
        assert!(pump.tick(&mut scene).is_none());
        assert!(pump.registry().is_empty());
    }

    #[rstest]
    fn listener_threads_block_until_the_frame_loop_runs(mut scene: Scene) {
        let (sender, mut pump) = job_queue(ReflectionTable::new());
        let waiter = {
            let sender = sender.clone();
            thread::spawn(move || sender.submit(find("Foo")).wait())
        };
        while sender.is_empty() {
            thread::yield_now();
        }
        pump.tick(&mut scene).expect("job");
        let completion = waiter.join().expect("join").expect("completion");
        assert_eq!(completion.state, JobState::Complete);
    }

    #[test]
    fn panic_payloads_are_transcribed() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "request execution panicked");
    }
}
