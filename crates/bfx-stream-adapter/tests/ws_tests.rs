/*
[INPUT]:  WebSocket test scenarios
[OUTPUT]: Test results for dispatcher and WebSocket client
[POS]:    Integration tests - WebSocket
[UPDATE]: When dispatcher rules or WebSocket client change
*/

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bfx_stream_adapter::ws::{DropReason, commands};
use bfx_stream_adapter::{
    BfxError, BfxWebSocket, ControlEvent, DataEvent, Dispatch, Dispatcher, EventKind,
    EventListeners, StreamEvent, Transformed, WsConfig,
};
use common::{funding_ticker_row, spawn_ws_server, trading_ticker_row};
use serde_json::{Value, json};
use tokio::time::timeout;
use tokio_test::assert_ok;

fn open_dispatcher() -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    dispatcher.open();
    dispatcher
}

#[test]
fn test_websocket_receiver_take_once() {
    let mut ws = BfxWebSocket::new();
    assert!(ws.take_receiver().is_some());
    assert!(ws.take_receiver().is_none());
}

#[test]
fn test_subscribe_flow_registers_channel() {
    let mut dispatcher = open_dispatcher();

    let ack = dispatcher.handle_text(
        r#"{"event":"subscribed","channel":"ticker","chanId":22,"symbol":"tBTCUSD","pair":"BTCUSD"}"#,
    );
    assert!(matches!(ack, Dispatch::Control(ControlEvent::Subscribed(ref sub)) if sub.chan_id == 22));

    let meta = dispatcher.registry().lookup(22).unwrap();
    assert_eq!(meta.channel, "ticker");
    assert_eq!(meta.symbol.as_deref(), Some("tBTCUSD"));

    let frame = json!([22, trading_ticker_row()]).to_string();
    let Dispatch::Data(DataEvent::Ticker { symbol, data }) = dispatcher.handle_text(&frame) else {
        panic!("expected ticker event");
    };
    assert_eq!(symbol, "tBTCUSD");
    let record = data.as_record().unwrap();
    assert_eq!(record["BID"], json!(7616.5));
    assert_eq!(record["LAST_PRICE"], json!(7617.1));
}

#[test]
fn test_funding_ticker_has_thirteen_fields() {
    let mut dispatcher = open_dispatcher();
    dispatcher.handle_text(r#"{"event":"subscribed","channel":"ticker","chanId":7,"symbol":"fUSD"}"#);

    let frame = json!([7, funding_ticker_row()]).to_string();
    let Some(StreamEvent::Data(DataEvent::Ticker { data, .. })) =
        dispatcher.handle_text(&frame).into_event()
    else {
        panic!("expected ticker event");
    };

    let record = data.as_record().unwrap();
    assert_eq!(record.len(), 13);
    assert_eq!(record["FRR"], json!(0.0003));
    assert_eq!(record["ASK_PERIOD"], json!(2));
}

#[test]
fn test_heartbeat_is_suppressed() {
    let mut dispatcher = open_dispatcher();
    dispatcher.handle_text(r#"{"event":"subscribed","channel":"ticker","chanId":22,"symbol":"tBTCUSD"}"#);

    let result = dispatcher.handle_text(r#"[22,"hb"]"#);

    assert_eq!(result, Dispatch::Dropped(DropReason::Heartbeat));
    assert!(result.into_event().is_none());
}

#[test]
fn test_unknown_channel_is_dropped_safely() {
    let mut dispatcher = open_dispatcher();

    let result = dispatcher.handle_text(r#"[999,[1,2,3]]"#);

    assert_eq!(result, Dispatch::Dropped(DropReason::UnknownChannel(999)));
    assert!(dispatcher.registry().is_empty());
}

#[test]
fn test_info_event_forwarded() {
    let mut dispatcher = open_dispatcher();

    let result = dispatcher.handle_text(r#"{"event":"info","version":2,"platform":{"status":1}}"#);

    match result {
        Dispatch::Control(ControlEvent::Other { event, payload }) => {
            assert_eq!(event, "info");
            assert_eq!(payload["version"], json!(2));
        }
        other => panic!("unexpected dispatch: {other:?}"),
    }
}

#[test]
fn test_book_snapshot_then_update() {
    let mut dispatcher = open_dispatcher();
    dispatcher.handle_text(
        r#"{"event":"subscribed","channel":"book","chanId":5,"symbol":"tBTCUSD","prec":"P0","len":"25"}"#,
    );

    let snapshot = dispatcher.handle_text(r#"[5,[[7254.7,3,3.3],[7254.6,2,-1.5]]]"#);
    let Dispatch::Data(DataEvent::OrderBook { data, .. }) = snapshot else {
        panic!("expected orderbook event");
    };
    let rows = data.as_records().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["AMOUNT"], json!(-1.5));

    let update = dispatcher.handle_text(r#"[5,[7254.5,1,0.25]]"#);
    let Dispatch::Data(DataEvent::OrderBook { data, .. }) = update else {
        panic!("expected orderbook event");
    };
    assert_eq!(data.as_record().unwrap()["COUNT"], json!(1));
}

#[tokio::test]
async fn test_client_end_to_end() {
    let subscribed = json!({"event": "subscribed", "channel": "ticker", "chanId": 22, "symbol": "tBTCUSD"});
    let frames = vec![
        json!({"event": "info", "version": 2}).to_string(),
        subscribed.to_string(),
        json!([22, "hb"]).to_string(),
        json!([22, trading_ticker_row()]).to_string(),
    ];
    let (url, mut seen) = spawn_ws_server(frames, 1).await;

    let mut ws = BfxWebSocket::with_config(WsConfig {
        url,
        ..WsConfig::default()
    });
    let mut events = ws.take_receiver().unwrap();

    assert_ok!(ws.connect().await);
    assert_ok!(ws.subscribe_ticker("tBTCUSD").await);

    let sent: Value = serde_json::from_str(&seen.recv().await.unwrap()).unwrap();
    assert_eq!(sent, commands::subscribe_ticker("tBTCUSD"));

    let mut kinds = Vec::new();
    let mut ticker = None;
    while let Ok(Some(event)) = timeout(Duration::from_secs(5), events.recv()).await {
        let kind = event.kind();
        if let StreamEvent::Data(DataEvent::Ticker { data, .. }) = &event {
            ticker = Some(data.clone());
        }
        kinds.push(kind.clone());
        if kind == EventKind::Close {
            break;
        }
    }

    assert_eq!(
        kinds,
        vec![
            EventKind::Open,
            EventKind::Other("info".to_string()),
            EventKind::Subscribed,
            EventKind::Ticker,
            EventKind::Close,
        ]
    );
    let ticker = ticker.unwrap();
    assert_eq!(ticker.as_record().unwrap()["ASK"], json!(7617.5));
    assert!(!ws.is_connected().await);
}

#[tokio::test]
async fn test_listeners_receive_client_events() {
    let frames = vec![
        json!({"event": "subscribed", "channel": "trades", "chanId": 3, "symbol": "tETHUSD"}).to_string(),
        json!([3, [[401597395, 1574694478808_u64, 0.005, 7245.3]]]).to_string(),
        json!([3, "te", [401597396, 1574694478809_u64, -0.1, 7245.2]]).to_string(),
    ];
    let (url, _seen) = spawn_ws_server(frames, 1).await;

    let mut ws = BfxWebSocket::with_config(WsConfig {
        url,
        ..WsConfig::default()
    });
    let events = ws.take_receiver().unwrap();

    let trades = Arc::new(Mutex::new(Vec::<Transformed>::new()));
    let mut listeners = EventListeners::new();
    let sink = trades.clone();
    listeners.on(EventKind::Trade, move |event| {
        if let StreamEvent::Data(DataEvent::Trade { data, .. }) = event {
            sink.lock().unwrap().push(data.clone());
        }
    });

    assert_ok!(ws.connect().await);
    assert_ok!(ws.subscribe_trades("tETHUSD").await);

    // The server closes after its script, which ends the event stream once
    // the client is dropped.
    let runner = tokio::spawn(listeners.run(events));
    tokio::time::sleep(Duration::from_millis(200)).await;
    drop(ws);
    assert_ok!(timeout(Duration::from_secs(5), runner).await);

    let trades = trades.lock().unwrap();
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].as_records().unwrap()[0]["ID"], json!(401597395));
    match &trades[1] {
        Transformed::Opcode(opcode, record) => {
            assert_eq!(opcode, "te");
            assert_eq!(record["PRICE"], json!(7245.2));
        }
        other => panic!("unexpected trade payload: {other:?}"),
    }
}

#[tokio::test]
async fn test_connect_failure_is_websocket_error() {
    let ws = BfxWebSocket::with_config(WsConfig {
        url: "ws://127.0.0.1:1".to_string(),
        ..WsConfig::default()
    });

    let err = ws.connect().await.unwrap_err();

    assert!(err.is_retryable());
    assert!(!ws.is_connected().await);
}

#[tokio::test]
async fn test_second_connect_rejected_before_handshake() {
    // The scripted server accepts one connection, so a second handshake
    // would only end at the connect timeout.
    let (url, _seen) = spawn_ws_server(Vec::new(), 1).await;
    let ws = BfxWebSocket::with_config(WsConfig {
        url,
        connect_timeout: Duration::from_secs(1),
        ..WsConfig::default()
    });

    assert_ok!(ws.connect().await);
    let err = ws.connect().await.unwrap_err();

    assert!(matches!(err, BfxError::WebSocket(ref message) if message.contains("already connected")));
    assert!(ws.is_connected().await);
}
