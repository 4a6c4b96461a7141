use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use crate::Secret;

pub(crate) const fn _default_false() -> bool {
    false
}

pub(crate) const fn _default_true() -> bool {
    true
}

#[inline]
pub(crate) fn _default_database_url() -> Secret<String> {
    Secret::new("sqlite:data/db".to_owned())
}

#[inline]
pub(crate) fn _default_http_listen() -> SocketAddr {
    #[allow(clippy::unwrap_used)]
    "0.0.0.0:8087".to_socket_addrs().unwrap().next().unwrap()
}

#[inline]
pub(crate) fn _default_session_max_age() -> Duration {
    Duration::from_secs(60 * 30)
}

#[inline]
pub(crate) fn _default_cookie_max_age() -> Duration {
    Duration::from_secs(60 * 60 * 24)
}

pub(crate) const fn _default_smtp_port() -> u16 {
    587
}

#[inline]
pub(crate) fn _default_sender_name() -> String {
    "Membergate".to_owned()
}

#[inline]
pub(crate) fn _default_two_factor_code_ttl() -> Duration {
    Duration::from_secs(180)
}

#[inline]
pub(crate) fn _default_delete_code_ttl() -> Duration {
    Duration::from_secs(300)
}

pub(crate) const fn _default_zero() -> u32 {
    0
}

pub(crate) const fn _default_remind_days() -> u32 {
    5
}

pub(crate) const fn _default_delete_days() -> u32 {
    7
}

#[inline]
pub(crate) fn _default_locale() -> String {
    "en".to_owned()
}
