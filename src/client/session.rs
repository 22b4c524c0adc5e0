// Connection Session — 서버와의 WS 연결 1개. 비즈니스 로직 없음
//
// open() → 핸드셰이크 {name} 전송 → transport_loop 태스크 시작
// 이벤트 순서: Opened → Message(...)* → Closed(reason)  (Closed 이후 종단)
// Closed 이후의 send()는 TransportError::Closed. 재접속은 새 open()으로만

use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use crate::config;
use crate::error::TransportError;
use crate::protocol::codec::encode_handshake;
use crate::utils::normalize_name;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink   = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Opened,
    Message(String),
    Closed(CloseReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// 서버가 Close 프레임을 보냈거나 스트림이 끝남
    ServerClosed,
    Error(String),
    /// 이쪽에서 close() 또는 Session drop
    Local,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::ServerClosed => write!(f, "server closed the connection"),
            CloseReason::Error(e)     => write!(f, "transport error: {}", e),
            CloseReason::Local        => write!(f, "closed locally"),
        }
    }
}

enum Outbound {
    Text(String),
    Close,
}

pub struct Session {
    endpoint: String,
    cmd_tx:   mpsc::UnboundedSender<Outbound>,
    closed:   Arc<AtomicBool>,
}

impl Session {
    /// 연결 + 핸드셰이크. 이벤트 수신자는 호출자가 소유
    pub async fn open(
        endpoint:     &str,
        display_name: &str,
    ) -> Result<(Self, mpsc::Receiver<SessionEvent>), TransportError> {
        let connect_err = |reason: String| TransportError::Connect { endpoint: endpoint.to_string(), reason };

        let (ws, _) = connect_async(endpoint).await.map_err(|e| connect_err(e.to_string()))?;
        let (mut ws_tx, ws_rx) = ws.split();

        let display_name = normalize_name(display_name);
        ws_tx.send(Message::Text(encode_handshake(&display_name).into()))
            .await
            .map_err(|e| connect_err(e.to_string()))?;
        debug!("[session] connected to {} as {}", endpoint, display_name);

        let (cmd_tx, cmd_rx)     = mpsc::unbounded_channel::<Outbound>();
        let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(config::SESSION_EVENT_QUEUE_SIZE);
        let closed = Arc::new(AtomicBool::new(false));

        tokio::spawn(transport_loop(ws_tx, ws_rx, cmd_rx, event_tx, Arc::clone(&closed)));

        let session = Self { endpoint: endpoint.to_string(), cmd_tx, closed };
        Ok((session, event_rx))
    }

    pub fn send(&self, text: String) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        self.cmd_tx.send(Outbound::Text(text)).map_err(|_| TransportError::Closed)
    }

    /// Close 프레임 전송 요청. 이후 Closed(Local) 이벤트가 마지막으로 도착
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            let _ = self.cmd_tx.send(Outbound::Close);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

// ----------------------------------------------------------------------------
// [transport_loop] 송신 명령 / 수신 프레임 다중화
// ----------------------------------------------------------------------------

async fn transport_loop(
    mut ws_tx:  WsSink,
    mut ws_rx:  WsSource,
    mut cmd_rx: mpsc::UnboundedReceiver<Outbound>,
    event_tx:   mpsc::Sender<SessionEvent>,
    closed:     Arc<AtomicBool>,
) {
    let _ = event_tx.send(SessionEvent::Opened).await;

    let reason = loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(Outbound::Text(text)) => {
                    trace!("[session] -> {}", text);
                    if let Err(e) = ws_tx.send(Message::Text(text.into())).await {
                        break CloseReason::Error(e.to_string());
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break CloseReason::Local;
                }
            },
            incoming = ws_rx.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if event_tx.send(SessionEvent::Message(text.as_str().to_string())).await.is_err() {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break CloseReason::Local;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break CloseReason::ServerClosed,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("[session] receive error: {}", e);
                    break CloseReason::Error(e.to_string());
                }
            },
        }
    };

    closed.store(true, Ordering::Release);
    debug!("[session] closed: {}", reason);
    // Closed는 마지막 이벤트이므로 버리지 않고 대기 후 전송
    let _ = event_tx.send(SessionEvent::Closed(reason)).await;
}
