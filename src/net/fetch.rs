use crate::net::{Body, Response};
use bytes::Bytes;
use std::io::{self, Read};
use tokio::runtime::Handle;
use url::Url;

pub const DEFAULT_USER_AGENT: &str = "Gosub/1.0 (X11; Linux x86_64) Gecko/20250802 GosubBrowser/1.0";

// Loads an URL and returns the response without reading its body
pub async fn fetch(url: Url) -> Result<Response, reqwest::Error> {
    let client = reqwest::Client::builder()
        .user_agent(DEFAULT_USER_AGENT)
        .build()?;
    let res = client.get(url).send().await?;

    Ok(Response::from_reqwest(res, Handle::current()))
}

impl Response {
    /// Wraps an async reqwest response. The body is pulled chunk by chunk on the runtime behind
    /// `handle`, so reading it must happen on a thread that is *not* driving that runtime (ie:
    /// a `spawn_blocking` worker).
    ///
    /// Informational, `204` and `304` responses have no body entity.
    pub fn from_reqwest(res: reqwest::Response, handle: Handle) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();

        let has_entity = !matches!(status, 204 | 304) && !(100..200).contains(&status);
        let body = has_entity.then(|| {
            let content_length = res.content_length();
            Body::new(ReqwestBody::new(res, handle), content_length)
        });

        Response::new(status, headers, body)
    }
}

/// Blocking [`Read`] over the body of an async reqwest response.
struct ReqwestBody {
    res: reqwest::Response,
    handle: Handle,
    pending: Bytes,
    done: bool,
}

impl ReqwestBody {
    fn new(res: reqwest::Response, handle: Handle) -> Self {
        Self {
            res,
            handle,
            pending: Bytes::new(),
            done: false,
        }
    }
}

impl Read for ReqwestBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pending.is_empty() {
            if self.done {
                return Ok(0);
            }
            match self.handle.block_on(self.res.chunk()) {
                Ok(Some(chunk)) => self.pending = chunk,
                Ok(None) => self.done = true,
                Err(e) => {
                    self.done = true;
                    return Err(io::Error::other(e));
                }
            }
        }

        let n = buf.len().min(self.pending.len());
        let chunk = self.pending.split_to(n);
        buf[..n].copy_from_slice(&chunk);
        Ok(n)
    }
}
