//! PostgreSQL query engine backend
//!
//! Concrete engine using tokio-postgres. A target's catalog selects the
//! database and its schema is pinned through `search_path`. Rows are streamed
//! from the server and grouped into pages of `page_size`.

use crate::config::ConnectionConfig;
use crate::config::connections::{CatalogTarget, SslMode};
use crate::db::engine::{Connection, Connector};
use crate::db::types::{CellValue, ResultPage};
use crate::error::{DbError, DbResult};
use futures::{TryStreamExt, pin_mut};
use rust_decimal::Decimal;
use tokio_postgres::Client;
use tokio_postgres::types::{ToSql, Type};

/// Opens PostgreSQL connections with the process-wide endpoint and credentials
#[derive(Debug, Clone)]
pub struct PostgresConnector {
    config: ConnectionConfig,
    page_size: usize,
}

impl PostgresConnector {
    pub fn new(config: ConnectionConfig, page_size: usize) -> Self {
        Self {
            config,
            page_size: page_size.max(1),
        }
    }
}

/// One PostgreSQL session bound to a catalog/schema
pub struct PostgresConnection {
    client: Client,
    page_size: usize,
}

impl Connector for PostgresConnector {
    type Conn = PostgresConnection;

    async fn connect(&self, target: &CatalogTarget) -> DbResult<PostgresConnection> {
        let conn_string = self.config.connection_string_with_password(target);
        let label = target.to_string();

        let client = match self.config.ssl_mode {
            SslMode::Disable => {
                let (client, connection) =
                    tokio_postgres::connect(&conn_string, tokio_postgres::NoTls)
                        .await
                        .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        tracing::warn!(target_key = %label, error = %e, "Connection lost");
                    }
                });
                client
            }
            SslMode::Prefer | SslMode::Require => {
                let tls = tokio_postgres_rustls::MakeRustlsConnect::new(make_tls_config());
                let (client, connection) = tokio_postgres::connect(&conn_string, tls)
                    .await
                    .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        tracing::warn!(target_key = %label, error = %e, "Connection lost");
                    }
                });
                client
            }
        };

        Ok(PostgresConnection {
            client,
            page_size: self.page_size,
        })
    }
}

impl Connection for PostgresConnection {
    async fn fetch_pages(&self, sql: &str) -> DbResult<Vec<ResultPage>> {
        let stmt = self
            .client
            .prepare(sql)
            .await
            .map_err(|e| DbError::QueryFailed(e.to_string()))?;

        let columns: Vec<String> = stmt.columns().iter().map(|c| c.name().to_string()).collect();
        let types: Vec<Type> = stmt.columns().iter().map(|c| c.type_().clone()).collect();

        let no_params: [&(dyn ToSql + Sync); 0] = [];
        let stream = self
            .client
            .query_raw(&stmt, slice_iter(&no_params))
            .await
            .map_err(|e| DbError::QueryFailed(e.to_string()))?;
        pin_mut!(stream);

        let mut pages = vec![ResultPage {
            columns: Some(columns),
            rows: Vec::new(),
        }];

        while let Some(row) = stream
            .try_next()
            .await
            .map_err(|e| DbError::QueryFailed(e.to_string()))?
        {
            let values = types
                .iter()
                .enumerate()
                .map(|(i, ty)| extract_cell_value(&row, i, ty))
                .collect();

            let needs_page = pages
                .last()
                .is_none_or(|page| page.rows.len() >= self.page_size);
            if needs_page {
                pages.push(ResultPage::default());
            }
            if let Some(page) = pages.last_mut() {
                page.rows.push(values);
            }
        }

        Ok(pages)
    }
}

fn slice_iter<'a>(
    s: &'a [&'a (dyn ToSql + Sync)],
) -> impl ExactSizeIterator<Item = &'a dyn ToSql> + 'a {
    s.iter().map(|s| *s as _)
}

/// Build a rustls ClientConfig that trusts OS certificates (with Mozilla roots as fallback)
fn make_tls_config() -> rustls::ClientConfig {
    let mut root_store = rustls::RootCertStore::empty();

    let native_certs = rustls_native_certs::load_native_certs();
    let mut loaded = 0;
    for cert in native_certs.certs {
        if root_store.add(cert).is_ok() {
            loaded += 1;
        }
    }
    if loaded == 0 {
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth()
}

/// Flatten a PostgreSQL value into a [`CellValue`].
///
/// Integers and floats keep their numeric form; everything else is rendered
/// as text. Returns `CellValue::Null` only for actual NULL values.
fn extract_cell_value(row: &tokio_postgres::Row, idx: usize, ty: &Type) -> CellValue {
    match *ty {
        Type::INT2 => opt(row.try_get::<_, Option<i16>>(idx), |v| CellValue::Integer(v as i64))
            .unwrap_or_else(|| try_as_string(row, idx)),
        Type::INT4 => opt(row.try_get::<_, Option<i32>>(idx), |v| CellValue::Integer(v as i64))
            .unwrap_or_else(|| try_as_string(row, idx)),
        Type::INT8 => opt(row.try_get::<_, Option<i64>>(idx), CellValue::Integer)
            .unwrap_or_else(|| try_as_string(row, idx)),
        Type::FLOAT4 => opt(row.try_get::<_, Option<f32>>(idx), |v| CellValue::Float(v as f64))
            .unwrap_or_else(|| try_as_string(row, idx)),
        Type::FLOAT8 => opt(row.try_get::<_, Option<f64>>(idx), CellValue::Float)
            .unwrap_or_else(|| try_as_string(row, idx)),
        Type::NUMERIC => opt(row.try_get::<_, Option<Decimal>>(idx), |v| {
            CellValue::Text(v.to_string())
        })
        .unwrap_or_else(|| try_as_string(row, idx)),
        Type::BOOL => opt(row.try_get::<_, Option<bool>>(idx), |v| {
            CellValue::Text(v.to_string())
        })
        .unwrap_or_else(|| try_as_string(row, idx)),
        Type::DATE => opt(row.try_get::<_, Option<chrono::NaiveDate>>(idx), |v| {
            CellValue::Text(v.to_string())
        })
        .unwrap_or_else(|| try_as_string(row, idx)),
        Type::TIMESTAMP => opt(row.try_get::<_, Option<chrono::NaiveDateTime>>(idx), |v| {
            CellValue::Text(v.to_string())
        })
        .unwrap_or_else(|| try_as_string(row, idx)),
        Type::TIMESTAMPTZ => opt(
            row.try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx),
            |v| CellValue::Text(v.to_rfc3339()),
        )
        .unwrap_or_else(|| try_as_string(row, idx)),
        Type::TIME => opt(row.try_get::<_, Option<chrono::NaiveTime>>(idx), |v| {
            CellValue::Text(v.to_string())
        })
        .unwrap_or_else(|| try_as_string(row, idx)),
        Type::JSON | Type::JSONB => opt(row.try_get::<_, Option<serde_json::Value>>(idx), |v| {
            CellValue::Text(v.to_string())
        })
        .unwrap_or_else(|| try_as_string(row, idx)),
        Type::UUID => opt(row.try_get::<_, Option<uuid::Uuid>>(idx), |v| {
            CellValue::Text(v.to_string())
        })
        .unwrap_or_else(|| try_as_string(row, idx)),
        Type::BYTEA => opt(row.try_get::<_, Option<Vec<u8>>>(idx), |v| {
            CellValue::Text(hex_encode(&v))
        })
        .unwrap_or_else(|| try_as_string(row, idx)),
        // Text types and fallback for unknown types
        _ => try_as_string(row, idx),
    }
}

/// Map a typed extraction: `Some(Null)` for NULL, `None` when the type didn't match
fn opt<T>(
    res: Result<Option<T>, tokio_postgres::Error>,
    f: impl FnOnce(T) -> CellValue,
) -> Option<CellValue> {
    match res {
        Ok(Some(v)) => Some(f(v)),
        Ok(None) => Some(CellValue::Null),
        Err(_) => None,
    }
}

/// Try to extract a value as a string (fallback for type mismatches).
///
/// When even the string fallback fails, includes the postgres type name
/// in the message so the caller knows what type couldn't be displayed.
fn try_as_string(row: &tokio_postgres::Row, idx: usize) -> CellValue {
    match row.try_get::<_, Option<String>>(idx) {
        Ok(Some(v)) => CellValue::Text(v),
        Ok(None) => CellValue::Null,
        Err(_) => {
            let type_name = row
                .columns()
                .get(idx)
                .map_or("unknown", |c| c.type_().name());
            CellValue::Text(format!("<unable to display: {}>", type_name))
        }
    }
}

/// Hex-encode binary data (e.g. `\xdeadbeef`).
fn hex_encode(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(2 + bytes.len() * 2);
    s.push_str("\\x");
    for b in bytes {
        s.push_str(&format!("{:02x}", b));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_encode() {
        assert_eq!(hex_encode(&[0xde, 0xad, 0xbe, 0xef]), "\\xdeadbeef");
        assert_eq!(hex_encode(&[]), "\\x");
    }

    #[test]
    fn test_page_size_is_at_least_one() {
        let config = ConnectionConfig::from_url("postgres://u@localhost/db").unwrap();
        let connector = PostgresConnector::new(config, 0);
        assert_eq!(connector.page_size, 1);
    }
}
