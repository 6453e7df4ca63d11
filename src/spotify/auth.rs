use anyhow::{Context, Result};
use std::collections::HashMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::info;

pub struct AuthRedirect {
    pub code: String,
}

/// `host:port` the redirect URI points at.
pub fn listen_addr(redirect_uri: &str) -> Result<&str> {
    let rest = redirect_uri
        .strip_prefix("http://")
        .context("Redirect URI must be a plain http:// loopback address")?;
    let authority = rest.split('/').next().unwrap_or(rest);
    if authority.contains(':') {
        Ok(authority)
    } else {
        anyhow::bail!("Redirect URI {redirect_uri} has no port to listen on")
    }
}

/// Pulls the authorization `code` out of a raw `GET /path?query HTTP/1.1` request.
pub fn parse_redirect(request: &str) -> Result<AuthRedirect> {
    let query = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|path| path.split_once('?').map(|(_, q)| q))
        .unwrap_or("");

    let params: HashMap<&str, String> = query
        .split('&')
        .filter_map(|kv| {
            let (key, value) = kv.split_once('=')?;
            let value = urlencoding::decode(value).ok()?.into_owned();
            Some((key, value))
        })
        .collect();

    if let Some(error) = params.get("error") {
        anyhow::bail!("Spotify sign-in was declined: {error}");
    }
    let code = params.get("code").context("No code in redirect")?.clone();
    Ok(AuthRedirect { code })
}

/// Accepts a single connection on the redirect address and returns the
/// authorization code it carries.
pub async fn wait_for_auth_code(redirect_uri: &str) -> Result<AuthRedirect> {
    let addr = listen_addr(redirect_uri)?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr} for OAuth redirect"))?;

    info!("Waiting for Spotify auth redirect on {redirect_uri} ...");

    let (mut stream, _) = listener.accept().await?;
    let mut buf = vec![0u8; 4096];
    let n = stream.read(&mut buf).await?;
    let request = String::from_utf8_lossy(&buf[..n]);
    let redirect = parse_redirect(&request);

    let body = match &redirect {
        Ok(_) => "<h1>emolody</h1><p>Signed in. You can close this tab and return to your terminal.</p>",
        Err(_) => "<h1>emolody</h1><p>Sign-in did not complete. Check your terminal.</p>",
    };
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.flush().await?;

    redirect
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listen_addr_from_redirect_uri() {
        assert_eq!(listen_addr("http://127.0.0.1:8989/login").unwrap(), "127.0.0.1:8989");
        assert!(listen_addr("https://example.com/cb").is_err());
        assert!(listen_addr("http://localhost/cb").is_err());
    }

    #[test]
    fn test_parse_redirect_decodes_code() {
        let req = "GET /login?code=AQ%2Fabc&state=xyz HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n";
        let redirect = parse_redirect(req).unwrap();
        assert_eq!(redirect.code, "AQ/abc");
    }

    #[test]
    fn test_parse_redirect_reports_denial() {
        let req = "GET /login?error=access_denied HTTP/1.1\r\n\r\n";
        let err = parse_redirect(req).err().unwrap();
        assert!(err.to_string().contains("access_denied"));
    }
}
