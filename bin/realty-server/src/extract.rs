use core::convert::Infallible;

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use realty_domain::audit::AuditContext;

use crate::App;

pub(crate) const USER_ID_HEADER: &str = "x-user-id";

pub(crate) const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// The actor and origin of a request, attached to every audit entry it causes.
///
/// The actor comes from the `x-user-id` header. The origin is the peer address, or the first
/// hop of `x-forwarded-for` when the app trusts that header. Clients can set it freely, so
/// only trust it behind a proxy that overwrites it.
#[derive(Debug)]
pub(crate) struct AuditOrigin(pub AuditContext);

impl FromRequestParts<App> for AuditOrigin {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, app: &App) -> Result<Self, Self::Rejection> {
        let user_id = header_str(&parts.headers, USER_ID_HEADER).map(str::to_owned);

        let forwarded = app
            .trust_forwarded_for
            .then(|| header_str(&parts.headers, FORWARDED_FOR_HEADER))
            .flatten();

        let ip_address = forwarded
            .and_then(|forwarded| forwarded.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_owned)
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            });

        let context =
            AuditContext::builder().maybe_user_id(user_id).maybe_ip_address(ip_address).build();

        Ok(Self(context))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok()).filter(|s| !s.is_empty())
}
