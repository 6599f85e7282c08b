use rhythm_engine::messaging::EventConsumer;
use rhythm_engine::{
    ChannelListener, EngineConfig, Metronome, Rhythm, SchedulerEvent, TempoMarkings, TrackId,
    create_event_channel, deserialize, validate,
};
use ringbuf::traits::Consumer;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// Sized for several bars of 1/16 notes at the top BPM between two polls
const EVENT_RINGBUFFER_CAPACITY: usize = 256;
const POLL_INTERVAL: Duration = Duration::from_millis(5);

const USAGE: &str = "usage: rhythm_engine [RHYTHM] [BPM] [SECONDS] [SECONDARY_RHYTHM]";

struct Args {
    primary: String,
    bpm: u32,
    seconds: u64,
    secondary: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let primary = args.next().unwrap_or_else(|| "{4/4}Q;q;q;q;".to_string());
    let bpm = match args.next() {
        Some(text) => text.parse().map_err(|_| format!("invalid BPM: {text}"))?,
        None => 120,
    };
    let seconds = match args.next() {
        Some(text) => text.parse().map_err(|_| format!("invalid duration: {text}"))?,
        None => 8,
    };
    Ok(Args {
        primary,
        bpm,
        seconds,
        secondary: args.next(),
    })
}

fn parse_rhythm(label: &str, text: &str) -> Result<Rhythm, String> {
    let rhythm = deserialize(text);
    let errors = validate(&rhythm);
    if errors.is_empty() {
        return Ok(rhythm);
    }

    let mut message = format!("{label} rhythm \"{text}\" is not playable:");
    for error in &errors {
        message.push_str(&format!("\n  - {error}"));
    }
    Err(message)
}

fn attach_channel(metronome: &Metronome, track: TrackId) -> (Arc<ChannelListener>, EventConsumer) {
    let (producer, consumer) = create_event_channel(EVENT_RINGBUFFER_CAPACITY);
    let listener = Arc::new(ChannelListener::new(track, producer));
    metronome.track(track).subscribe(listener.clone());
    (listener, consumer)
}

fn print_event(event: &SchedulerEvent, started: Instant) {
    let elapsed = started.elapsed().as_millis();
    match event {
        SchedulerEvent::Beat { track, beat } => {
            let marker = if beat.is_rest() {
                "."
            } else if beat.is_emphasized {
                "X"
            } else {
                "x"
            };
            println!(
                "{elapsed:>7} ms  {track:?}  cycle {} measure {} beat {}  {marker}",
                beat.cycle,
                beat.measure_index + 1,
                beat.beat_index_within_measure + 1,
            );
        }
        SchedulerEvent::PauseChanged { track, paused } => {
            println!("{elapsed:>7} ms  {track:?}  paused = {paused}");
        }
    }
}

fn run(args: Args) -> Result<(), String> {
    let config = EngineConfig::default();
    let mut metronome = Metronome::new(config);

    let primary = parse_rhythm("Primary", &args.primary)?;
    metronome
        .set_rhythm(TrackId::Primary, primary)
        .map_err(|e| e.to_string())?;

    if let Some(text) = &args.secondary {
        let secondary = parse_rhythm("Secondary", text)?;
        metronome
            .set_rhythm(TrackId::Secondary, secondary)
            .map_err(|e| e.to_string())?;
        metronome
            .set_secondary_enabled(true)
            .map_err(|e| e.to_string())?;
    }

    metronome.set_bpm(args.bpm);
    let markings = TempoMarkings::default();
    let marking = markings
        .lookup(metronome.bpm())
        .map(|m| m.name.as_str())
        .unwrap_or("-");
    println!("=== Rhythm Engine ===");
    println!("{} BPM ({marking}) for {} s\n", metronome.bpm(), args.seconds);

    let mut channels = vec![attach_channel(&metronome, TrackId::Primary)];
    if metronome.secondary_enabled() {
        channels.push(attach_channel(&metronome, TrackId::Secondary));
    }

    metronome.start().map_err(|e| e.to_string())?;
    let started = Instant::now();
    let deadline = started + Duration::from_secs(args.seconds);

    while Instant::now() < deadline {
        for (_, consumer) in channels.iter_mut() {
            while let Some(event) = consumer.try_pop() {
                print_event(&event, started);
            }
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    metronome.stop();

    for (listener, _) in &channels {
        if listener.dropped() > 0 {
            tracing::warn!(dropped = listener.dropped(), "Events lost while printing");
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let result = parse_args().and_then(run);
    if let Err(message) = result {
        eprintln!("ERROR: {message}");
        eprintln!("{USAGE}");
        std::process::exit(1);
    }
}
