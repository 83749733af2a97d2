use std::time::{Duration, Instant};

use flick_core::config::Config;
use flick_core::contract::{HostMessage, OutboundMessage, QueryRequest, StateSnapshot};
use flick_core::controller::{Disposition, OverlayController};
use flick_core::transport::{
    handle_json, handle_message, ErrorCode, JsonLineHost, JsonLineSink, JsonLineView,
};

type LineController = OverlayController<JsonLineHost<Vec<u8>>, JsonLineView<Vec<u8>>>;

fn line_controller() -> (LineController, JsonLineSink<Vec<u8>>) {
    let sink = JsonLineSink::new(Vec::new());
    let mut controller =
        OverlayController::new(&Config::default(), JsonLineHost::new(sink.clone())).unwrap();
    controller.attach_view(JsonLineView::new(sink.clone()));
    (controller, sink)
}

fn emitted(sink: &JsonLineSink<Vec<u8>>) -> Vec<OutboundMessage> {
    String::from_utf8(sink.writer().clone())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn host_messages_use_kind_and_payload_tags() {
    let message = HostMessage::Query(QueryRequest {
        query: "calc".into(),
    });
    let encoded = serde_json::to_string(&message).unwrap();
    assert_eq!(encoded, r#"{"kind":"query","payload":{"query":"calc"}}"#);

    let hook: HostMessage = serde_json::from_str(r#"{"kind":"hook"}"#).unwrap();
    assert_eq!(hook, HostMessage::Hook);
}

#[test]
fn invalid_json_is_reported_with_error_code() {
    let (mut controller, _sink) = line_controller();

    let error = handle_json(&mut controller, "{not-json", Instant::now()).unwrap_err();

    assert_eq!(error.code, ErrorCode::InvalidJson);
}

#[test]
fn blank_key_code_is_an_invalid_request() {
    let (mut controller, _sink) = line_controller();

    let error = handle_json(
        &mut controller,
        r#"{"kind":"key","payload":{"code":"  "}}"#,
        Instant::now(),
    )
    .unwrap_err();

    assert_eq!(error.code, ErrorCode::InvalidRequest);
}

#[test]
fn hook_and_escape_produce_toggle_focus_and_reset_lines() {
    let (mut controller, sink) = line_controller();
    let start = Instant::now();

    handle_json(&mut controller, r#"{"kind":"hook"}"#, start).unwrap();
    handle_json(
        &mut controller,
        r#"{"kind":"key","payload":{"code":"Escape"}}"#,
        start,
    )
    .unwrap();
    controller.poll_timers(start + Duration::from_millis(250));

    assert_eq!(
        emitted(&sink),
        vec![
            OutboundMessage::Toggle { code: 1 },
            OutboundMessage::Focus {
                field: "input".into()
            },
            OutboundMessage::Toggle { code: 2 },
            OutboundMessage::Reset,
        ]
    );
}

#[test]
fn arrow_key_message_prevents_default() {
    let (mut controller, sink) = line_controller();

    let disposition = handle_json(
        &mut controller,
        r#"{"kind":"key","payload":{"code":"ArrowDown"}}"#,
        Instant::now(),
    )
    .unwrap();

    assert_eq!(disposition, Disposition::PreventDefault);
    assert_eq!(emitted(&sink), vec![OutboundMessage::Select { direction: 1 }]);
}

#[test]
fn catalog_push_accepts_json5_text_and_assets() {
    let (mut controller, _sink) = line_controller();
    let push = r#"{
        "kind": "catalog",
        "payload": {
            "entries": "[{ names: ['Calculator', 'calc'], icon: 0 }]",
            "links": [{ "name": "Calendar" }],
            "assets": [{ "data": [1, 2, 3], "type": "image/png" }]
        }
    }"#;

    handle_json(&mut controller, push, Instant::now()).unwrap();
    handle_message(
        &mut controller,
        HostMessage::Query(QueryRequest { query: "cal".into() }),
        Instant::now(),
    )
    .unwrap();

    let matches = controller.state().matches();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].display(), "Calculator");
    assert!(matches[0].display_icon.handle().is_some());
    assert_eq!(matches[1].display(), "Calendar");
}

#[test]
fn snapshot_pairs_alias_span_with_the_alias() {
    let (mut controller, _sink) = line_controller();
    let push = r#"{"kind":"catalog",
        "payload":{"entries":[{"names":["Windows Calculator","calc"]}]}}"#;

    handle_json(&mut controller, push, Instant::now()).unwrap();
    handle_json(&mut controller, r#"{"kind":"query","payload":{"query":"calc"}}"#, Instant::now())
        .unwrap();

    let snapshot = StateSnapshot::from(controller.state());
    let dto = &snapshot.matches[0];
    assert_eq!(dto.display, "Windows Calculator");
    assert_eq!(dto.matched_name, "calc");
    assert_eq!((dto.start, dto.len), (0, 4));
}

#[test]
fn hide_message_without_restore_sends_dismiss() {
    let (mut controller, sink) = line_controller();
    let start = Instant::now();

    handle_json(&mut controller, r#"{"kind":"hook"}"#, start).unwrap();
    handle_json(
        &mut controller,
        r#"{"kind":"hide","payload":{"restore":false}}"#,
        start,
    )
    .unwrap();
    controller.poll_timers(start + Duration::from_millis(250));

    assert!(emitted(&sink).contains(&OutboundMessage::Toggle { code: 0 }));
}
