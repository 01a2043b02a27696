use axum::body::Bytes;
use futures::stream::{self, Stream, StreamExt};
use std::convert::Infallible;
use std::fmt::Display;
use std::pin::Pin;

use crate::stream::{data_frame, FollowUpFrame, DONE_FRAME};

/// Frames appended once the upstream stream has ended cleanly.
pub fn trailer(follow_ups: Vec<String>) -> Bytes {
    let mut out = String::new();

    if !follow_ups.is_empty() {
        match data_frame(&FollowUpFrame::new(follow_ups)) {
            Ok(frame) => out.push_str(&frame),
            Err(error) => tracing::warn!(%error, "Failed to encode follow-up frame"),
        }
    }

    out.push_str(DONE_FRAME);
    Bytes::from(out)
}

enum Relay<S> {
    Body { upstream: Pin<Box<S>>, trailer: Bytes },
    Finished,
}

/// Forward upstream chunks untouched, then the trailer.
///
/// An upstream error ends the body right there: it is logged and the
/// trailer is never sent.
pub fn relay_with_trailer<S, B, E>(
    upstream: S,
    follow_ups: Vec<String>,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: Into<Bytes> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = Relay::Body {
        upstream: Box::pin(upstream),
        trailer: trailer(follow_ups),
    };

    stream::unfold(state, |state| async move {
        match state {
            Relay::Body {
                mut upstream,
                trailer,
            } => match upstream.next().await {
                Some(Ok(chunk)) => Some((Ok(chunk.into()), Relay::Body { upstream, trailer })),
                Some(Err(error)) => {
                    tracing::error!(%error, "Stream error");
                    None
                }
                None => Some((Ok(trailer), Relay::Finished)),
            },
            Relay::Finished => None,
        }
    })
}
