mod error;

pub use self::error::PoolError;

use core::num::NonZeroUsize;

use diesel::ConnectionError;
use diesel_async::{
    AsyncPgConnection,
    pooled_connection::{
        AsyncDieselConnectionManager, ManagerConfig,
        deadpool::{Object, Pool},
    },
};
use rustls::{ClientConfig, RootCertStore};
use rustls_native_certs::CertificateResult;
use tokio::task;
use tokio_postgres_rustls::MakeRustlsConnect;

/// A deadpool of async diesel connections to PostgreSQL.
pub type DbPool = Pool<AsyncPgConnection>;

/// A pooled connection, handed back to the pool on drop.
pub type DbConn = Object<AsyncPgConnection>;

/// Builds a pool of at most `max_size` connections to `url`.
///
/// Connections negotiate TLS against the platform's native root certificates when the server
/// offers it. No connection is opened until the first checkout, so an unreachable database
/// surfaces on first use rather than here.
///
/// # Errors
///
/// Fails if loading the native certificates panics or the pool configuration is rejected.
#[tracing::instrument(skip(url))]
pub async fn establish_pool<U>(url: U, max_size: NonZeroUsize) -> Result<DbPool, PoolError>
where
    String: From<U>,
{
    let tls = task::spawn_blocking(make_rustls_config).await?;

    let mut manager_config = ManagerConfig::default();
    manager_config.custom_setup = Box::new(move |url: &str| {
        let tls = tls.clone();
        let url = url.to_string();
        Box::pin(async move {
            let (client, conn) = tokio_postgres::connect(&url, tls)
                .await
                .map_err(|e| e.to_string())
                .map_err(ConnectionError::BadConnection)?;

            tokio::spawn(async move {
                if let Err(err) = conn.await {
                    tracing::warn!(%err, "postgres connection closed");
                }
            });

            AsyncPgConnection::try_from(client).await
        })
    });

    let manager =
        AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(url, manager_config);

    Pool::builder(manager).max_size(max_size.get()).build().map_err(From::from)
}

fn make_rustls_config() -> MakeRustlsConnect {
    let CertificateResult { certs, errors, .. } = rustls_native_certs::load_native_certs();

    for err in errors {
        tracing::warn!(%err, "skipping native root certificate source");
    }

    let mut cert_store = RootCertStore::empty();
    let (added, ignored) = cert_store.add_parsable_certificates(certs);

    tracing::debug!(added, ignored, "loaded native root certificates");

    let config = ClientConfig::builder().with_root_certificates(cert_store).with_no_client_auth();

    MakeRustlsConnect::new(config)
}
