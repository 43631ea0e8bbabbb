use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use time::{Duration, OffsetDateTime};

use crate::state::AuthSettings;

pub const COOKIE_NAME: &str = "bookmark";
const COOKIE_LIFETIME: Duration = Duration::hours(90_000);

pub fn is_authorized(jar: &CookieJar, auth: &AuthSettings) -> bool {
    jar.get(COOKIE_NAME).is_some_and(|c| c.value() == auth.secret)
}

pub fn issue(jar: CookieJar, auth: &AuthSettings) -> CookieJar {
    let cookie = Cookie::build((COOKIE_NAME, auth.secret.clone()))
        .path("/").domain(auth.cookie_domain.clone()).http_only(true).same_site(SameSite::Lax)
        .expires(OffsetDateTime::now_utc() + COOKIE_LIFETIME).build();
    jar.add(cookie)
}
