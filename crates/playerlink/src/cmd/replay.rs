use std::cell::{Cell, RefCell};
use std::fs;
use std::path::Path;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use playerlink_peer::{
    DeferredState, DispatchOutcome, DispatchReport, Event, Host, HostConfig, PeerDeferred,
};
use playerlink_transport::{FrameHandle, InboundMessage, RecordingTransport};

use crate::cmd::{read_stdin, ReplayArgs};
use crate::exit::{io_error, peer_error, CliError, CliResult, DATA_INVALID, FAILURE, SUCCESS};
use crate::output::{or_dash, print_json, table, OutputFormat};

/// One transcript line. `message` is the raw payload string, or the JSON
/// object that was posted.
#[derive(Debug, Deserialize)]
struct TranscriptLine {
    frame: u64,
    message: Value,
}

impl TranscriptLine {
    fn into_inbound(self) -> InboundMessage {
        let data = match self.message {
            Value::String(raw) => raw,
            other => other.to_string(),
        };
        InboundMessage::new(FrameHandle::new(self.frame), data)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventRow {
    pub line: usize,
    pub frame: u64,
    pub event: String,
    pub peer_id: Option<String>,
    pub handlers: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeerRow {
    pub peer_id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct ReplayReport {
    pub messages: usize,
    pub dispatched: usize,
    pub foreign: usize,
    pub malformed: usize,
    pub all_loaded: bool,
    pub peers: Vec<PeerRow>,
    pub inserted: Vec<PeerRow>,
    pub events: Vec<EventRow>,
}

impl ReplayReport {
    fn every_peer_ready(&self) -> bool {
        self.peers
            .iter()
            .chain(self.inserted.iter())
            .all(|peer| peer.status == "ready")
    }
}

pub fn run(args: ReplayArgs, format: OutputFormat) -> CliResult<i32> {
    let transcript = read_transcript(&args.transcript)?;
    let report = replay(&args, &transcript)?;
    print_report(&report, format);

    Ok(if report.every_peer_ready() {
        SUCCESS
    } else {
        FAILURE
    })
}

fn read_transcript(path: &Path) -> CliResult<String> {
    if path.as_os_str() == "-" {
        return read_stdin();
    }
    fs::read_to_string(path)
        .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))
}

fn replay(args: &ReplayArgs, transcript: &str) -> CliResult<ReplayReport> {
    let config = HostConfig::default().with_wire(args.wire.config()?);
    let host = Host::with_config(config, Rc::new(RecordingTransport::new()))
        .map_err(|err| peer_error("host setup failed", err))?;

    let current_line = Rc::new(Cell::new(0usize));
    let events = Rc::new(RefCell::new(Vec::new()));
    {
        let current_line = Rc::clone(&current_line);
        let events = Rc::clone(&events);
        host.set_event_spy(move |event: &Event, report: &DispatchReport| {
            events.borrow_mut().push(EventRow {
                line: current_line.get(),
                frame: event.source.raw(),
                event: event.name.clone(),
                peer_id: event.peer_id(),
                handlers: report.total(),
                failed: report.failed,
            });
        });
    }

    let lookups: Vec<(String, PeerDeferred)> = args
        .find
        .iter()
        .map(|peer_id| (peer_id.clone(), host.find_peer(peer_id)))
        .collect();
    let inserts: Vec<(String, PeerDeferred)> = args
        .insert
        .iter()
        .map(|alias| (alias.clone(), host.insert_peer(alias)))
        .collect();

    let frames = (1..=args.frames).map(FrameHandle::new);
    let mut initialized = false;
    if args.init_after == 0 {
        host.initialize(frames.clone());
        initialized = true;
    }

    let mut report = ReplayReport::default();
    for (index, line) in transcript.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let entry: TranscriptLine = serde_json::from_str(line).map_err(|err| {
            CliError::new(
                DATA_INVALID,
                format!("transcript line {}: {err}", index + 1),
            )
        })?;

        current_line.set(index + 1);
        match host.handle_message(&entry.into_inbound()) {
            DispatchOutcome::Dispatched(_) => report.dispatched += 1,
            DispatchOutcome::Foreign => report.foreign += 1,
            DispatchOutcome::Malformed => report.malformed += 1,
        }
        report.messages += 1;

        if !initialized && report.messages >= args.init_after {
            host.initialize(frames.clone());
            initialized = true;
        }
    }

    if !initialized {
        host.initialize(frames);
    }
    if args.seal {
        host.seal();
    }

    report.all_loaded = host.all_loaded();
    tracing::debug!(
        messages = report.messages,
        dispatched = report.dispatched,
        all_loaded = report.all_loaded,
        "transcript replayed"
    );
    report.peers = lookups.iter().map(peer_row).collect();
    report.inserted = inserts.iter().map(peer_row).collect();
    report.events = events.take();
    Ok(report)
}

fn peer_row((peer_id, deferred): &(String, PeerDeferred)) -> PeerRow {
    let mut row = PeerRow {
        peer_id: peer_id.clone(),
        status: "pending",
        frame: None,
        title: None,
        current_page: None,
        error: None,
    };
    match deferred.state() {
        DeferredState::Pending => {}
        DeferredState::Resolved => {
            if let Some(experience) = deferred.value() {
                row.status = "ready";
                row.peer_id = experience.id().to_string();
                row.frame = Some(experience.frame().raw());
                row.title = Some(experience.title().to_string());
                row.current_page = Some(experience.current_page_number());
            }
        }
        DeferredState::Rejected => {
            row.status = "not-found";
            row.error = deferred.error().map(|err| err.to_string());
        }
    }
    row
}

fn print_report(report: &ReplayReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            let mut peers = table(&["PEER", "STATUS", "FRAME", "TITLE", "PAGE", "ERROR"]);
            for peer in report.peers.iter().chain(report.inserted.iter()) {
                peers.add_row(vec![
                    peer.peer_id.clone(),
                    peer.status.to_string(),
                    peer.frame.map(|f| f.to_string()).unwrap_or_else(|| "-".into()),
                    or_dash(peer.title.as_deref()),
                    peer.current_page
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| "-".into()),
                    or_dash(peer.error.as_deref()),
                ]);
            }
            println!("{peers}");

            let mut events = table(&["LINE", "FRAME", "EVENT", "PEER", "HANDLERS", "FAILED"]);
            for event in &report.events {
                events.add_row(vec![
                    event.line.to_string(),
                    event.frame.to_string(),
                    event.event.clone(),
                    or_dash(event.peer_id.as_deref()),
                    event.handlers.to_string(),
                    event.failed.to_string(),
                ]);
            }
            println!("{events}");
            println!(
                "messages={} dispatched={} foreign={} malformed={} all_loaded={}",
                report.messages,
                report.dispatched,
                report.foreign,
                report.malformed,
                report.all_loaded
            );
        }
        OutputFormat::Pretty => {
            for peer in report.peers.iter().chain(report.inserted.iter()) {
                match peer.status {
                    "ready" => println!(
                        "peer {} ready frame={} page={}",
                        peer.peer_id,
                        peer.frame.unwrap_or_default(),
                        peer.current_page.unwrap_or_default()
                    ),
                    status => println!(
                        "peer {} {}{}",
                        peer.peer_id,
                        status,
                        peer.error
                            .as_deref()
                            .map(|err| format!(": {err}"))
                            .unwrap_or_default()
                    ),
                }
            }
            for event in &report.events {
                println!(
                    "line {} frame={} {} peer={} handlers={}",
                    event.line,
                    event.frame,
                    event.event,
                    or_dash(event.peer_id.as_deref()),
                    event.handlers
                );
            }
        }
    }
}
