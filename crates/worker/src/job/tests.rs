use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::*;

const WAIT: Duration = Duration::from_secs(5);

fn recording_sink() -> (ProgressSink, Arc<Mutex<Vec<JobProgress>>>) {
	let seen = Arc::new(Mutex::new(Vec::new()));
	let sink_seen = Arc::clone(&seen);
	(Box::new(move |progress| sink_seen.lock().push(progress)), seen)
}

#[test]
fn empty_job_reports_running_then_finished() {
	let (sink, seen) = recording_sink();
	let runner = CancellableJobRunner::start("empty", Vec::new(), Some(sink));

	assert!(runner.wait_for_completion(WAIT));
	assert_eq!(runner.state(), JobState::Finished);
	assert_eq!(
		*seen.lock(),
		vec![JobProgress::new(JobState::Running, 0, 0), JobProgress::new(JobState::Finished, 0, 0)]
	);
}

#[test]
fn runs_all_steps_in_order() {
	let (sink, seen) = recording_sink();
	let order = Arc::new(Mutex::new(Vec::new()));
	let operations: Vec<JobOperation> = (0..3)
		.map(|i| {
			let order = Arc::clone(&order);
			Box::new(move |_: &CancellationToken| {
				order.lock().push(i);
				Ok(())
			}) as JobOperation
		})
		.collect();

	let runner = CancellableJobRunner::start("ordered", operations, Some(sink));
	assert!(runner.wait_for_completion(WAIT));

	assert_eq!(*order.lock(), vec![0, 1, 2]);
	assert_eq!(runner.state(), JobState::Finished);
	assert_eq!(seen.lock().last(), Some(&JobProgress::new(JobState::Finished, 3, 3)));
	assert_eq!(seen.lock().len(), 5);
}

#[test]
fn steps_run_off_the_calling_thread() {
	let caller = std::thread::current().id();
	let ran_elsewhere = Arc::new(AtomicBool::new(false));
	let flag = Arc::clone(&ran_elsewhere);
	let runner = CancellableJobRunner::start(
		"thread",
		vec![Box::new(move |_: &CancellationToken| {
			flag.store(std::thread::current().id() != caller, Ordering::SeqCst);
			Ok(())
		})],
		None,
	);

	assert!(runner.wait_for_completion(WAIT));
	assert!(ran_elsewhere.load(Ordering::SeqCst));
}

#[test]
fn cancel_from_first_step_skips_the_rest() {
	let (sink, seen) = recording_sink();
	let second_ran = Arc::new(AtomicBool::new(false));
	let second_flag = Arc::clone(&second_ran);

	let operations: Vec<JobOperation> = vec![
		Box::new(|token: &CancellationToken| {
			token.cancel();
			Ok(())
		}),
		Box::new(move |_: &CancellationToken| {
			second_flag.store(true, Ordering::SeqCst);
			Ok(())
		}),
	];
	let runner = CancellableJobRunner::start("cancelled", operations, Some(sink));

	assert!(runner.wait_for_completion(WAIT));
	assert!(!second_ran.load(Ordering::SeqCst));
	assert_eq!(runner.state(), JobState::Cancelled);
	assert_eq!(
		*seen.lock(),
		vec![JobProgress::new(JobState::Running, 0, 2), JobProgress::new(JobState::Cancelled, 0, 2)]
	);
}

#[test]
fn external_cancel_is_observed_at_the_next_boundary() {
	let gate = Arc::new((Mutex::new(false), Condvar::new()));
	let step_gate = Arc::clone(&gate);
	let later_steps = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&later_steps);

	let operations: Vec<JobOperation> = vec![
		Box::new(move |_: &CancellationToken| {
			let (lock, cvar) = &*step_gate;
			let mut open = lock.lock();
			let _ = cvar.wait_while_for(&mut open, |open| !*open, WAIT);
			Ok(())
		}),
		Box::new(move |_: &CancellationToken| {
			counter.fetch_add(1, Ordering::SeqCst);
			Ok(())
		}),
	];
	let runner = CancellableJobRunner::start("external", operations, None);
	runner.cancel();
	{
		let (lock, cvar) = &*gate;
		*lock.lock() = true;
		cvar.notify_all();
	}

	assert!(runner.wait_for_completion(WAIT));
	assert_eq!(runner.state(), JobState::Cancelled);
	assert_eq!(later_steps.load(Ordering::SeqCst), 0);
}

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLog {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.lock().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

#[test]
fn failing_step_faults_the_job_and_is_logged() {
	let log = CapturedLog::default();
	let writer = log.clone();
	let subscriber = tracing_subscriber::fmt().with_ansi(false).with_writer(move || writer.clone()).finish();

	let second_ran = Arc::new(AtomicBool::new(false));
	let second_flag = Arc::clone(&second_ran);
	let (sink, seen) = recording_sink();

	tracing::subscriber::with_default(subscriber, || {
		let operations: Vec<JobOperation> = vec![
			Box::new(|_: &CancellationToken| Err::<(), _>(anyhow::anyhow!("binding step exploded"))),
			Box::new(move |_: &CancellationToken| {
				second_flag.store(true, Ordering::SeqCst);
				Ok(())
			}),
		];
		let runner = CancellableJobRunner::start("faulty", operations, Some(sink));

		assert!(runner.wait_for_completion(WAIT));
		assert_eq!(runner.state(), JobState::Faulted);
		assert_eq!(runner.fault_message().as_deref(), Some("binding step exploded"));
	});

	assert!(!second_ran.load(Ordering::SeqCst));
	assert_eq!(seen.lock().last(), Some(&JobProgress::new(JobState::Faulted, 0, 2)));
	let logged = String::from_utf8_lossy(&log.0.lock()).into_owned();
	assert!(logged.contains("binding step exploded"), "log was: {logged}");
}

#[test]
fn panicking_step_faults_the_job() {
	let runner = CancellableJobRunner::start("panicky", vec![Box::new(|_: &CancellationToken| -> anyhow::Result<()> { panic!("step panicked") })], None);

	assert!(runner.wait_for_completion(WAIT));
	assert_eq!(runner.state(), JobState::Faulted);
	assert_eq!(runner.fault_message().as_deref(), Some("step panicked"));
}
