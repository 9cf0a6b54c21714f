use chrono::{DateTime, Utc};
use cookie::{Cookie, CookieJar};

use crate::host::HostEnvironment;

// return empty cookie jar for unparsable cookies
pub fn parse_cookies_to_jar(s: &str) -> CookieJar {
    let cookie_str = s.trim().to_owned();
    let mut jar = CookieJar::new();
    let cookies = Cookie::split_parse(cookie_str).filter_map(Result::ok);

    for cookie in cookies {
        jar.add_original(cookie);
    }

    jar
}

/// Read a single cookie value from the host's cookie header.
pub fn get_cookie<E: HostEnvironment + ?Sized>(env: &E, name: &str) -> Option<String> {
    let header = env.cookie_header()?;
    let jar = parse_cookies_to_jar(&header);
    jar.get(name).map(|cookie| cookie.value().to_string())
}

/// Formats a first-party cookie assignment expiring at `expires`.
pub fn create_cookie(name: &str, value: &str, expires: DateTime<Utc>) -> String {
    format!(
        "{}={}; Expires={}; Path=/; SameSite=Lax",
        name,
        value,
        expires.format("%a, %d %b %Y %H:%M:%S GMT"),
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::environment::MemoryEnvironment;

    #[test]
    fn test_parse_cookies_to_jar() {
        let header_value = "c1=v1; c2=v2";
        let jar = parse_cookies_to_jar(header_value);

        assert!(jar.iter().count() == 2);
        assert_eq!(jar.get("c1").expect("should have c1").value(), "v1");
        assert_eq!(jar.get("c2").expect("should have c2").value(), "v2");
    }

    #[test]
    fn test_parse_cookies_to_jar_not_unique() {
        let cookie_str = "c1=v1;c1=v2";
        let jar = parse_cookies_to_jar(cookie_str);

        assert!(jar.iter().count() == 1);
        assert_eq!(jar.get("c1").expect("should have c1").value(), "v2");
    }

    #[test]
    fn test_parse_cookies_to_jar_empty() {
        let jar = parse_cookies_to_jar("");

        assert!(jar.iter().count() == 0);
    }

    #[test]
    fn test_parse_cookies_to_jar_invalid() {
        let jar = parse_cookies_to_jar("invalid");

        assert!(jar.iter().count() == 0);
    }

    #[test]
    fn test_create_cookie() {
        let expires = Utc
            .with_ymd_and_hms(2024, 3, 9, 16, 5, 0)
            .single()
            .expect("should build timestamp");

        assert_eq!(
            create_cookie("hb_insticator_uid", "abc", expires),
            "hb_insticator_uid=abc; Expires=Sat, 09 Mar 2024 16:05:00 GMT; Path=/; SameSite=Lax"
        );
    }

    #[test]
    fn test_get_cookie_reads_host_header() {
        let env = MemoryEnvironment::default();
        env.set_cookie(&create_cookie(
            "hb_insticator_uid",
            "value-1",
            Utc::now() + chrono::Duration::days(1),
        ));

        assert_eq!(
            get_cookie(&env, "hb_insticator_uid").as_deref(),
            Some("value-1")
        );
        assert_eq!(get_cookie(&env, "missing"), None);
    }
}
