//! Translation of a single HTTP request into the bidirectional `Chat` call.
//!
//! The request body is read as a sequence of JSON messages, each one sent to the
//! backend as soon as it is complete. Replies are written back as newline-delimited
//! JSON while the request body is still being read:
//!
//! ```text
//! request body ──▶ sender loop ──▶ Chat call ──▶ receiver loop ──▶ response body
//! ```
//!
//! The first error on either side ends that side of the call.
//! An error from the backend is reported as a last `{"error": ...}` line.

use ::std::convert::Infallible;

use ::axum::{
    body::Body,
    extract::State,
    response::{IntoResponse, Response},
};
use ::bytes::Bytes;
use ::http::header::CONTENT_TYPE;
use ::serde::Serialize;
use ::serde_json::Deserializer;
use ::tokio::sync::mpsc;
use ::tokio_stream::{wrappers::ReceiverStream, StreamExt};
use ::tonic::Streaming;
use ::tracing::{debug, error, info, warn};
use ::usergate_common::user_grpc::{Message, MessageResponse};

use crate::{
    error::{ErrorBody, GatewayError},
    state::AppState,
};

/// Messages buffered in each direction of a chat call.
const CHAT_BUFFER_SIZE: usize = 16;

const NDJSON: &str = "application/x-ndjson";

/// Largest incomplete message kept in memory, same as axum's default body limit.
const MAX_BUFFERED_BYTES: usize = 2 * 1024 * 1024;

/// Incremental decoder of concatenated JSON messages.
#[derive(Debug)]
pub(super) struct MessageDecoder {
    buffer: Vec<u8>,
    limit: usize,
}

impl Default for MessageDecoder {
    fn default() -> Self {
        Self::with_limit(MAX_BUFFERED_BYTES)
    }
}

impl MessageDecoder {
    pub(super) fn with_limit(limit: usize) -> Self {
        Self {
            buffer: Vec::new(),
            limit,
        }
    }

    pub(super) fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Take the next complete message out of the buffer.
    /// # Return
    /// - `Ok(Some(Message))` if a whole message has been buffered.
    /// - `Ok(None)` if more data is needed.
    /// - `Err(_)` if the buffered data is not a valid message,
    ///   or an incomplete message is already longer than the limit.
    pub(super) fn next_message(&mut self) -> serde_json::Result<Option<Message>> {
        let mut values = Deserializer::from_slice(&self.buffer).into_iter::<Message>();
        let result = match values.next() {
            Some(Ok(message)) => Ok(Some(message)),
            Some(Err(err)) if err.is_eof() => Ok(None),
            Some(Err(err)) => Err(err),
            None => Ok(None),
        };
        // on EOF the offset stays at the start of the incomplete message
        let consumed = values.byte_offset();
        self.buffer.drain(..consumed);
        if matches!(result, Ok(None)) && self.buffer.len() > self.limit {
            return Err(serde::de::Error::custom(format!(
                "chat message exceeds {} bytes",
                self.limit
            )));
        }
        result
    }

    /// Check that nothing but whitespace is left once the input has ended.
    pub(super) fn finish(self) -> serde_json::Result<()> {
        if self.buffer.iter().all(u8::is_ascii_whitespace) {
            Ok(())
        } else {
            serde_json::from_slice::<Message>(&self.buffer).map(|_| ())
        }
    }
}

/// Sender loop: decode messages from the request body and send them to the backend.
/// Returning drops `outbound`, which closes the send side of the call.
async fn forward_messages(body: Body, outbound: mpsc::Sender<Message>) {
    let mut chunks = body.into_data_stream();
    let mut decoder = MessageDecoder::default();
    while let Some(chunk) = chunks.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => {
                warn!("Failed to read chat request: {}", err);
                return;
            }
        };
        decoder.push(&chunk);
        loop {
            match decoder.next_message() {
                Ok(Some(message)) => {
                    if outbound.send(message).await.is_err() {
                        debug!("Chat call is closed, stop sending");
                        return;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!("Failed to bind chat message: {}", err);
                    return;
                }
            }
        }
    }
    if let Err(err) = decoder.finish() {
        warn!("Failed to bind chat message: {}", err);
    }
}

fn json_line<T: Serialize>(value: &T) -> serde_json::Result<Bytes> {
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    Ok(Bytes::from(line))
}

/// Receiver loop: write every reply of the backend as one line of the response body.
/// Returning drops `lines`, which ends the response.
async fn forward_replies(
    mut replies: Streaming<MessageResponse>,
    lines: mpsc::Sender<Result<Bytes, Infallible>>,
) {
    loop {
        let (line, last) = match replies.message().await {
            Ok(Some(reply)) => (json_line(&reply), false),
            Ok(None) => {
                info!("End of stream");
                return;
            }
            Err(status) => {
                error!("Chat call failed: {}", status);
                let error = GatewayError::from(status);
                (json_line(&ErrorBody::from(&error)), true)
            }
        };
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                error!("Failed to encode chat reply: {}", err);
                return;
            }
        };
        if lines.send(Ok(line)).await.is_err() {
            // dropping `replies` cancels the call
            debug!("HTTP client is gone, stop receiving");
            return;
        }
        if last {
            return;
        }
    }
}

/// Open one `Chat` call for the request and run its sender and receiver loops.
pub(super) async fn chat(
    State(state): State<AppState>,
    body: Body,
) -> Result<Response, GatewayError> {
    let (message_tx, message_rx) = mpsc::channel(CHAT_BUFFER_SIZE);
    tokio::spawn(forward_messages(body, message_tx));

    let replies = state
        .get_client()
        .chat(ReceiverStream::new(message_rx))
        .await?
        .into_inner();
    info!("Chat call opened");

    let (line_tx, line_rx) = mpsc::channel(CHAT_BUFFER_SIZE);
    tokio::spawn(forward_replies(replies, line_tx));

    Ok((
        [(CONTENT_TYPE, NDJSON)],
        Body::from_stream(ReceiverStream::new(line_rx)),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(content: &str) -> Message {
        Message {
            content: content.to_owned(),
        }
    }

    fn drain(decoder: &mut MessageDecoder) -> serde_json::Result<Vec<Message>> {
        let mut messages = vec![];
        while let Some(message) = decoder.next_message()? {
            messages.push(message);
        }
        Ok(messages)
    }

    #[test]
    fn decode_concatenated_messages() -> serde_json::Result<()> {
        let mut decoder = MessageDecoder::default();
        decoder.push(br#"{"content":"a"}{"content":"b"}"#);
        decoder.push(b"\n {\"content\":\"c\"}\n");

        assert_eq!(
            drain(&mut decoder)?,
            vec![message("a"), message("b"), message("c")]
        );
        decoder.finish()
    }

    #[test]
    fn decode_message_split_across_chunks() -> serde_json::Result<()> {
        let mut decoder = MessageDecoder::default();
        decoder.push(br#"{"content":"hel"#);
        assert_eq!(decoder.next_message()?, None);

        decoder.push(br#"lo"}{"con"#);
        assert_eq!(decoder.next_message()?, Some(message("hello")));
        assert_eq!(decoder.next_message()?, None);

        decoder.push(br#"tent":"world"}"#);
        assert_eq!(decoder.next_message()?, Some(message("world")));
        decoder.finish()
    }

    #[test]
    fn decode_empty_input() -> serde_json::Result<()> {
        let mut decoder = MessageDecoder::default();
        decoder.push(b"  \n");
        assert_eq!(decoder.next_message()?, None);
        decoder.finish()
    }

    #[test]
    fn invalid_message_stops_decoding() -> serde_json::Result<()> {
        let mut decoder = MessageDecoder::default();
        decoder.push(br#"{"content":"ok"} "oops""#);

        assert_eq!(decoder.next_message()?, Some(message("ok")));
        assert!(decoder.next_message().is_err());
        Ok(())
    }

    #[test]
    fn incomplete_message_at_the_end() -> serde_json::Result<()> {
        let mut decoder = MessageDecoder::default();
        decoder.push(br#"{"content":"#);

        assert!(matches!(decoder.next_message(), Ok(None)));
        let err = decoder.finish().unwrap_err();
        assert!(err.is_eof());
        Ok(())
    }

    #[test]
    fn buffer_up_to_the_limit() -> serde_json::Result<()> {
        let mut decoder = MessageDecoder::default();
        decoder.push(br#"{"content":""#);
        decoder.push(&vec![b'a'; MAX_BUFFERED_BYTES - 12]);
        assert_eq!(decoder.next_message()?, None);

        decoder.push(b"a");
        let err = decoder.next_message().unwrap_err();
        assert_eq!(err.to_string(), "chat message exceeds 2097152 bytes");
        Ok(())
    }

    #[test]
    fn unfinished_message_over_the_limit() -> serde_json::Result<()> {
        let mut decoder = MessageDecoder::with_limit(16);
        decoder.push(br#"{"content":"a"}{"content":"too long"#);

        assert_eq!(decoder.next_message()?, Some(message("a")));
        assert!(decoder.next_message().is_err());
        Ok(())
    }

    #[test]
    fn complete_messages_free_the_buffer() -> serde_json::Result<()> {
        let mut decoder = MessageDecoder::with_limit(16);
        for _ in 0..4 {
            decoder.push(br#"{"content":"a"}"#);
            assert_eq!(decoder.next_message()?, Some(message("a")));
        }
        decoder.finish()
    }

    #[test]
    fn reply_as_json_line() -> serde_json::Result<()> {
        let line = json_line(&MessageResponse {
            reply: "Echo: hi".to_owned(),
        })?;
        assert_eq!(line, Bytes::from_static(b"{\"reply\":\"Echo: hi\"}\n"));
        Ok(())
    }
}
