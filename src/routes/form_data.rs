use actix_multipart::Multipart;
use actix_web::web;
use actix_web::HttpMessage;
use actix_web::HttpRequest;
use anyhow::Context;
use futures_util::StreamExt;

/// Upper bound on a submitted form, whichever encoding it uses
const MAX_BODY_BYTES: usize = 16 * 1024;

/// A decoded HTML form: every field, in submission order. Repeated names are
/// kept; `get` returns the first.
///
/// Both encodings a browser may send are accepted: a plain `<form>` post is
/// `application/x-www-form-urlencoded`, while `fetch(url, { body: new
/// FormData(form) })` sends `multipart/form-data`.
#[derive(Debug, Default)]
pub struct FormData {
    fields: Vec<(String, String)>,
}

impl FormData {
    pub fn get(
        &self,
        name: &str,
    ) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Any other content type, or a body that can't be decoded, is an error.
    pub async fn read(
        req: &HttpRequest,
        payload: web::Payload,
    ) -> Result<Self, anyhow::Error> {
        let mime = req
            .mime_type()
            .context("unparseable Content-Type")?
            .context("missing Content-Type")?;

        match mime.essence_str() {
            "application/x-www-form-urlencoded" => {
                let body = read_body(payload).await?;
                Self::from_urlencoded(&body)
            }
            "multipart/form-data" => {
                Self::from_multipart(Multipart::new(req.headers(), payload)).await
            }
            other => anyhow::bail!("unsupported Content-Type: {other}"),
        }
    }

    pub(crate) fn from_urlencoded(body: &[u8]) -> Result<Self, anyhow::Error> {
        // a list of pairs (unlike a struct) tolerates repeated keys
        let fields = serde_urlencoded::from_bytes(body).context("malformed urlencoded form")?;
        Ok(Self { fields })
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, anyhow::Error> {
        let mut fields = Vec::new();
        let mut total = 0;
        while let Some(field) = multipart.next().await {
            let mut field = field.map_err(|e| anyhow::anyhow!("malformed multipart form: {e}"))?;
            let name = field.name().unwrap_or_default().to_owned();

            let mut value = web::BytesMut::new();
            while let Some(chunk) = field.next().await {
                let chunk =
                    chunk.map_err(|e| anyhow::anyhow!("malformed multipart field {name:?}: {e}"))?;
                total += chunk.len();
                if total > MAX_BODY_BYTES {
                    anyhow::bail!("multipart form exceeds {MAX_BODY_BYTES} bytes");
                }
                value.extend_from_slice(&chunk);
            }

            let value = String::from_utf8(value.to_vec())
                .with_context(|| format!("multipart field {name:?} is not UTF-8"))?;
            fields.push((name, value));
        }
        Ok(Self { fields })
    }
}

async fn read_body(mut payload: web::Payload) -> Result<web::BytesMut, anyhow::Error> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| anyhow::anyhow!("failed to read request body: {e}"))?;
        if body.len() + chunk.len() > MAX_BODY_BYTES {
            anyhow::bail!("form exceeds {MAX_BODY_BYTES} bytes");
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
