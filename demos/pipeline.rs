//! A counter pipeline demonstrating evqueue's producer/consumer hand-off.
//!
//! Two client threads publish counter commands into a small queue, a
//! dispatcher peeks at the head before deciding whether to drop it, and the
//! main thread closes the queue once the clients are done. The consumer
//! drains what is left and stops at end of stream.
//!
//! Run with: `RUST_LOG=debug cargo run --example pipeline`

use evqueue::consumer::{self, Outcome};
use evqueue::{Error, EventQueue, Logic, Received};

use log::{info, warn};
use std::thread;
use std::time::Duration;

const PUBLISH_TIMEOUT: Duration = Duration::from_millis(50);
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Commands that can be sent to the counter.
#[derive(Debug, Clone)]
enum Command {
    Increment { client: &'static str },
    Decrement { client: &'static str },
    Reset,
}

/// Counter logic fed by the consumer loop.
struct CounterLogic {
    value: i64,
    handled: usize,
    idle_ticks: usize,
}

impl CounterLogic {
    fn new() -> Self {
        Self {
            value: 0,
            handled: 0,
            idle_ticks: 0,
        }
    }
}

impl Logic<Command> for CounterLogic {
    fn step(&mut self, command: Command) -> bool {
        self.handled += 1;
        match command {
            Command::Increment { client } => {
                self.value += 1;
                info!("[counter] {client} incremented to {}", self.value);
            }
            Command::Decrement { client } => {
                self.value -= 1;
                info!("[counter] {client} decremented to {}", self.value);
            }
            Command::Reset => {
                self.value = 0;
                info!("[counter] reset");
            }
        }
        true
    }

    fn idle(&mut self) -> bool {
        self.idle_ticks += 1;
        true
    }
}

fn client(queue: &EventQueue<Command>, name: &'static str, rounds: usize) {
    for round in 0..rounds {
        let command = if round % 3 == 2 {
            Command::Decrement { client: name }
        } else {
            Command::Increment { client: name }
        };

        // Retry on backpressure; give up once the queue is closed.
        loop {
            match queue.publish(command.clone(), PUBLISH_TIMEOUT) {
                Ok(()) => break,
                Err(Error::WriteTimeout) => warn!("[{name}] queue full, retrying"),
                Err(err) => {
                    warn!("[{name}] giving up: {err}");
                    return;
                }
            }
        }
        thread::sleep(Duration::from_millis(5));
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("evqueue pipeline example");
    println!("========================");

    let queue = EventQueue::new();
    let mut counter = CounterLogic::new();

    thread::scope(|s| {
        s.spawn(|| client(&queue, "alice", 12));
        s.spawn(|| client(&queue, "bob", 12));

        // Peek first: a reset at the head is dropped without reaching the counter.
        if let Err(err) = queue.publish(Command::Reset, PUBLISH_TIMEOUT) {
            warn!("[dispatcher] could not queue reset: {err}");
        }
        match queue.peek(POLL_INTERVAL) {
            Ok(Received::Event(Command::Reset)) => {
                let dropped = queue.read_peek();
                info!("[dispatcher] dropped {dropped:?} before dispatch");
            }
            Ok(other) => info!("[dispatcher] head is {other:?}, leaving it queued"),
            Err(err) => warn!("[dispatcher] peek failed: {err}"),
        }

        let consumer = s.spawn(|| consumer::run(&queue, &mut counter, POLL_INTERVAL));

        thread::sleep(Duration::from_millis(200));
        info!("[main] closing queue");
        queue.close();

        match consumer.join().expect("consumer thread panicked") {
            Ok(Outcome::EndOfStream) => info!("[main] consumer drained the queue"),
            Ok(Outcome::Stopped) => info!("[main] consumer stopped early"),
            Err(err) => warn!("[main] consumer failed: {err}"),
        }
    });

    println!(
        "handled {} commands, final value {}, {} idle ticks",
        counter.handled, counter.value, counter.idle_ticks
    );
}
