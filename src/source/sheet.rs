// src/source/sheet.rs

use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{Error, Result};
use crate::rows::{Row, TabularRows};

/// Fetch a published sheet export and split it into proper columns.
#[instrument(level = "info", skip(client), fields(url = %url))]
pub async fn fetch_sheet(client: &Client, url: &Url) -> Result<TabularRows> {
    let unreachable = |reason: String| Error::Unreachable {
        url: url.to_string(),
        reason,
    };

    debug!("fetching sheet export");
    let body = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| unreachable(e.to_string()))?
        .error_for_status()
        .map_err(|e| unreachable(e.to_string()))?
        .text()
        .await
        .map_err(|e| unreachable(e.to_string()))?;

    if body.trim().is_empty() {
        return Err(unreachable("empty response body".to_string()));
    }

    Ok(parse_sheet_export(&body))
}

/// Parse the export body.
///
/// The export arrives as a single artifact column: the header cell carries the
/// comma-joined true column names and each data cell the comma-joined values.
/// Both are trimmed and split on `,`; the header split becomes the header and
/// the artifact column itself is not kept. Rows with only empty fields are
/// dropped.
pub fn parse_sheet_export(body: &str) -> TabularRows {
    let mut cells = body.lines().map(str::trim).filter(|l| !l.is_empty());

    let header = match cells.next() {
        Some(cell) => split_cell(cell),
        None => return TabularRows::default(),
    };

    TabularRows::from_rows(header, cells.map(split_cell))
}

fn split_cell(cell: &str) -> Row {
    cell.split(',').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    /// Serve one HTTP response on a local port and return its URL.
    async fn serve_once(status: &'static str, body: &'static str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut conn, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = conn.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            conn.write_all(response.as_bytes()).await.unwrap();
            conn.shutdown().await.unwrap();
        });
        Url::parse(&format!("http://{}/export.csv", addr)).unwrap()
    }

    fn local_client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_header_cell_split_into_columns() {
        let table = parse_sheet_export("id,col1,col2\n1,a,x\n2,b,y\n");
        assert_eq!(table.header(), strings(&["id", "col1", "col2"]));
        assert_eq!(table.columns().len(), 3);
        assert_eq!(table.row(1).unwrap(), strings(&["2", "b", "y"]));
    }

    #[test]
    fn test_leading_blank_header_cell_kept() {
        let table = parse_sheet_export(",col1,col2,col3\r\nA,a,x,1\r\nB,b,y,2\r\nC,c,z,3\r\n");
        assert_eq!(table.header(), strings(&["", "col1", "col2", "col3"]));
        assert_eq!(table.len(), 3);
        assert_eq!(table.row(0).unwrap(), strings(&["A", "a", "x", "1"]));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let table = parse_sheet_export("id\n\n1\n   \n2\n\n");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_lines_trimmed_both_ends() {
        let table = parse_sheet_export("  id,col1 \n\t1,a  \r\n");
        assert_eq!(table.header(), strings(&["id", "col1"]));
        assert_eq!(table.row(0).unwrap(), strings(&["1", "a"]));
    }

    #[test]
    fn test_comma_only_rows_dropped() {
        let table = parse_sheet_export("id,name\n1,a\n,\n2,b\n");
        assert_eq!(table.len(), 2);
        assert_eq!(table.row(1).unwrap(), strings(&["2", "b"]));
    }

    #[tokio::test]
    async fn test_fetch_splits_served_export() {
        let url = serve_once("200 OK", "id,col1,col2\n1,a,x\n2,b,y\n").await;
        let table = fetch_sheet(&local_client(), &url).await.unwrap();
        assert_eq!(table.header(), strings(&["id", "col1", "col2"]));
        assert_eq!(table.len(), 2);
        assert_eq!(table.row(0).unwrap(), strings(&["1", "a", "x"]));
    }

    #[tokio::test]
    async fn test_fetch_error_status_is_unreachable() {
        let url = serve_once("404 Not Found", "missing").await;
        let err = fetch_sheet(&local_client(), &url).await.unwrap_err();
        match err {
            Error::Unreachable { url: got, reason } => {
                assert_eq!(got, url.to_string());
                assert!(reason.contains("404"), "{}", reason);
            }
            other => panic!("expected Unreachable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_blank_body_is_unreachable() {
        let url = serve_once("200 OK", "  \n").await;
        let err = fetch_sheet(&local_client(), &url).await.unwrap_err();
        assert!(matches!(err, Error::Unreachable { .. }));
    }

    #[test]
    fn test_empty_body() {
        let table = parse_sheet_export("");
        assert!(table.is_empty());
        assert!(table.header().is_empty());
    }
}
