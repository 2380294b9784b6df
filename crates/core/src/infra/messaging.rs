//! ページコンテキストと background コンテキスト間のメッセージチャネル。
//!
//! 1 リクエストにつき応答は必ず 1 つ。受信側が消えている、または応答せずに
//! 破棄した場合、送信側は [`BusError`] を受け取る。

use tokio::sync::{mpsc, oneshot};

use crate::domain::error::ErrorCode;
use crate::domain::types::{OptimizeResponse, RuntimeMessage};

const DEFAULT_CAPACITY: usize = 32;

/// 配信エラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    #[error("Could not establish connection. Receiving end does not exist.")]
    Disconnected,
    #[error("No response from background context")]
    NoResponse,
}

impl BusError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::Delivery
    }
}

/// 受信側に届くリクエスト（応答用チャネル付き）
#[derive(Debug)]
pub struct Envelope {
    pub message: RuntimeMessage,
    reply: oneshot::Sender<OptimizeResponse>,
}

impl Envelope {
    /// 応答を返す。送信側がすでに諦めていれば false。
    pub fn reply(self, response: OptimizeResponse) -> bool {
        self.reply.send(response).is_ok()
    }
}

/// ページ側の送信ハンドル
#[derive(Debug, Clone)]
pub struct RuntimeClient {
    tx: mpsc::Sender<Envelope>,
}

/// background 側の受信口
#[derive(Debug)]
pub struct RuntimeListener {
    rx: mpsc::Receiver<Envelope>,
}

pub fn channel() -> (RuntimeClient, RuntimeListener) {
    channel_with_capacity(DEFAULT_CAPACITY)
}

pub fn channel_with_capacity(capacity: usize) -> (RuntimeClient, RuntimeListener) {
    let (tx, rx) = mpsc::channel(capacity);
    (RuntimeClient { tx }, RuntimeListener { rx })
}

impl RuntimeClient {
    pub async fn send(&self, message: RuntimeMessage) -> Result<OptimizeResponse, BusError> {
        let (reply, reply_rx) = oneshot::channel();
        self.tx
            .send(Envelope { message, reply })
            .await
            .map_err(|_| BusError::Disconnected)?;
        reply_rx.await.map_err(|_| BusError::NoResponse)
    }

    pub fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }
}

impl RuntimeListener {
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    /// 待たずに取り出す。キューが空なら None。
    pub fn try_recv(&mut self) -> Option<Envelope> {
        self.rx.try_recv().ok()
    }
}
