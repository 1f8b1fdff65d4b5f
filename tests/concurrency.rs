use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use evqueue::{DEFAULT_CAPACITY, Error, EventQueue, Received};

const LONG: Duration = Duration::from_secs(5);

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn concurrent_publish_and_close_neither_loses_nor_duplicates() {
    init_logger();
    const PRODUCERS: u32 = 4;
    const PER_PRODUCER: u32 = 500;

    let queue = Arc::new(EventQueue::new());
    let start = Arc::new(Barrier::new(PRODUCERS as usize + 1));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let queue = Arc::clone(&queue);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                let mut published = Vec::new();
                for seq in 0..PER_PRODUCER {
                    let event = producer * PER_PRODUCER + seq;
                    match queue.publish(event, Duration::from_millis(50)) {
                        Ok(()) => published.push(event),
                        Err(Error::QueueClosed) => break,
                        Err(Error::WriteTimeout) => {}
                        Err(err) => panic!("unexpected publish error: {err}"),
                    }
                }
                published
            })
        })
        .collect();

    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let mut received = Vec::new();
            loop {
                match queue.read(LONG) {
                    Ok(Received::Event(event)) => received.push(event),
                    Ok(Received::EndOfStream) => return received,
                    Err(err) => panic!("consumer stalled: {err}"),
                }
            }
        })
    };

    start.wait();
    thread::sleep(Duration::from_millis(5));
    queue.close();

    let mut published = HashSet::new();
    for producer in producers {
        for event in producer.join().unwrap() {
            assert!(published.insert(event));
        }
    }

    let received = consumer.join().unwrap();
    let unique: HashSet<_> = received.iter().copied().collect();
    assert_eq!(unique.len(), received.len(), "an event was delivered twice");
    assert_eq!(unique, published);
}

#[test]
fn close_wakes_blocked_publisher() {
    init_logger();
    let queue = Arc::new(EventQueue::new());
    for event in 0..DEFAULT_CAPACITY {
        queue.publish(event, Duration::ZERO).unwrap();
    }

    let publisher = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let started = Instant::now();
            let result = queue.publish(DEFAULT_CAPACITY, LONG);
            (result, started.elapsed())
        })
    };

    thread::sleep(Duration::from_millis(50));
    queue.close();

    let (result, elapsed) = publisher.join().unwrap();
    assert_eq!(result, Err(Error::QueueClosed));
    assert!(elapsed < LONG, "publisher waited out its deadline");

    for expected in 0..DEFAULT_CAPACITY {
        assert_eq!(queue.read(LONG), Ok(Received::Event(expected)));
    }
    assert_eq!(queue.read(LONG), Ok(Received::EndOfStream));
}

#[test]
fn blocked_publisher_completes_when_reader_makes_room() {
    let queue = Arc::new(EventQueue::new());
    for event in 0..DEFAULT_CAPACITY {
        queue.publish(event, Duration::ZERO).unwrap();
    }

    let publisher = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.publish(DEFAULT_CAPACITY, LONG))
    };

    thread::sleep(Duration::from_millis(20));
    assert_eq!(queue.read(LONG), Ok(Received::Event(0)));
    assert_eq!(publisher.join().unwrap(), Ok(()));

    let rest: Vec<_> = (0..DEFAULT_CAPACITY)
        .map(|_| queue.read(LONG).unwrap().into_event().unwrap())
        .collect();
    assert_eq!(rest, (1..=DEFAULT_CAPACITY).collect::<Vec<_>>());
}

#[test]
fn close_wakes_blocked_readers_and_peekers() {
    init_logger();
    let queue: Arc<EventQueue<u32>> = Arc::new(EventQueue::new());

    let reader = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.read(LONG))
    };
    let peeker = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.peek(LONG))
    };

    thread::sleep(Duration::from_millis(50));
    let closed_at = Instant::now();
    queue.close();

    assert_eq!(reader.join().unwrap(), Ok(Received::EndOfStream));
    assert_eq!(peeker.join().unwrap(), Ok(Received::EndOfStream));
    assert!(closed_at.elapsed() < LONG);
}

#[test]
fn concurrent_peeks_observe_the_same_head() {
    let queue = Arc::new(EventQueue::new());
    let start = Arc::new(Barrier::new(4));

    let peekers: Vec<_> = (0..4)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                queue.peek(LONG)
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(20));
    queue.publish("first", LONG).unwrap();
    queue.publish("second", LONG).unwrap();

    for peeker in peekers {
        assert_eq!(peeker.join().unwrap(), Ok(Received::Event("first")));
    }
    assert_eq!(queue.read(LONG), Ok(Received::Event("first")));
    assert_eq!(queue.read(LONG), Ok(Received::Event("second")));
}

#[test]
fn read_peek_does_not_wait_for_a_blocked_peek() {
    let queue: Arc<EventQueue<u32>> = Arc::new(EventQueue::new());

    let peeker = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.peek(Duration::from_millis(300)))
    };

    thread::sleep(Duration::from_millis(20));
    let started = Instant::now();
    assert_eq!(queue.read_peek(), None);
    assert!(started.elapsed() < Duration::from_millis(200));

    assert_eq!(peeker.join().unwrap(), Err(Error::ReadTimeout));
}

#[test]
fn waiting_for_another_consumer_counts_against_the_timeout() {
    let queue: Arc<EventQueue<u32>> = Arc::new(EventQueue::new());

    let holder = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.read(Duration::from_millis(500)))
    };

    thread::sleep(Duration::from_millis(20));
    let started = Instant::now();
    assert_eq!(queue.read(Duration::from_millis(50)), Err(Error::ReadTimeout));
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_millis(400), "waited {elapsed:?}");

    assert_eq!(holder.join().unwrap(), Err(Error::ReadTimeout));
}
