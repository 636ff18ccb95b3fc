use amaretti::config::CookieDialect;
use amaretti::errors::{GenerateError, ParseError};
use amaretti::{
    CookieProcessor, MimeHeaders, Processor, ProcessorConfig, ResponseCookie, SameSite,
    ServerCookies,
};
use googletest::prelude::*;

fn processor(dialect: CookieDialect) -> Processor {
    let mut config = ProcessorConfig::default();
    config.dialect = dialect;
    config.into()
}

fn names_and_values(cookies: &ServerCookies) -> Vec<(&str, &str)> {
    cookies.iter().map(|c| (c.name(), c.value())).collect()
}

#[test]
fn one_collection_serves_many_requests() {
    let processor = processor(CookieDialect::Legacy);
    let mut cookies = ServerCookies::new(2);
    let mut headers = MimeHeaders::new();

    headers
        .add_value("Cookie", br#"$Version=1; a="b"; $Path=/x"#)
        .unwrap();
    headers.add_value("cookie", b"c=d").unwrap();
    processor.parse_cookie_header(&headers, &mut cookies).unwrap();
    assert_eq!(names_and_values(&cookies), [("a", "b"), ("c", "d")]);
    let first = cookies.find("a").unwrap();
    assert_that!(first.path(), some(eq("/x")));
    assert_that!(first.version(), eq(1));

    headers.recycle();
    cookies.recycle();

    headers.add_value("Cookie", b"e=f").unwrap();
    processor.parse_cookie_header(&headers, &mut cookies).unwrap();
    assert_eq!(names_and_values(&cookies), [("e", "f")]);
    let only = cookies.cookie(0).unwrap();
    assert_that!(only.path(), none());
    assert_that!(only.version(), eq(0));
}

#[test]
fn too_many_cookies() {
    let processor = processor(CookieDialect::Rfc6265);
    let mut cookies = ServerCookies::new(4);
    cookies.set_limit(Some(2));
    let outcome = processor.parse_header_value(b"a=1; b=2; c=3", &mut cookies);
    assert!(matches!(outcome, Err(ParseError::TooManyCookies(_))));
    assert_that!(cookies.cookie_count(), eq(2));
}

#[test]
fn dialects_disagree_on_quoting() {
    let cookie = ResponseCookie::new("greeting", "hello world");

    let legacy = processor(CookieDialect::Legacy);
    assert_that!(
        legacy.generate_header(&cookie).unwrap(),
        eq("greeting=\"hello world\"; Version=1")
    );

    let rfc6265 = processor(CookieDialect::Rfc6265);
    assert!(matches!(
        rfc6265.generate_header(&cookie),
        Err(GenerateError::InvalidValue { .. })
    ));
}

#[test]
fn processor_wide_attributes() {
    let mut config = ProcessorConfig::default();
    config.same_site = Some(SameSite::Strict);
    config.partitioned = true;
    let processor: Processor = config.into();

    let cookie = ResponseCookie::new("id", "42").set_secure(true);
    assert_that!(
        processor.generate_header(&cookie).unwrap(),
        eq("id=42; Secure; SameSite=Strict; Partitioned")
    );

    let cookie = ResponseCookie::new("id", "42")
        .set_same_site(SameSite::Lax)
        .set_partitioned(false);
    assert_that!(
        processor.generate_header(&cookie).unwrap(),
        eq("id=42; SameSite=Lax")
    );
}

#[test]
fn trait_objects() {
    let processors: Vec<Box<dyn CookieProcessor>> = vec![
        Box::new(processor(CookieDialect::Legacy)),
        Box::new(processor(CookieDialect::Rfc6265)),
    ];
    for p in &processors {
        let mut cookies = ServerCookies::new(1);
        p.parse_header_value(b"k=v", &mut cookies).unwrap();
        assert_eq!(names_and_values(&cookies), [("k", "v")]);
        assert_that!(
            p.generate_header(&ResponseCookie::new("k", "v")).unwrap(),
            eq("k=v")
        );
    }
}

#[cfg(feature = "digest")]
mod digest {
    use amaretti::digest::{
        Authentication, DigestAlgorithm, DigestAuthenticator, DigestConfig, DigestRequest,
        MapCredentials,
    };
    use googletest::prelude::*;

    /// Pulls `name="value"` out of a challenge.
    fn directive<'c>(challenge: &'c str, name: &str) -> &'c str {
        let start = challenge.find(&format!("{name}=\"")).unwrap() + name.len() + 2;
        let len = challenge[start..].find('"').unwrap();
        &challenge[start..start + len]
    }

    #[test]
    fn challenge_then_authenticate() {
        let mut config = DigestConfig::default();
        config.realm = "api".into();
        let authenticator = DigestAuthenticator::from(config);
        let mut users = MapCredentials::new();
        users.insert("alice", "secret");

        let request = DigestRequest {
            method: "POST",
            uri: "/orders",
            scheme: "https",
            host: Some("shop.example"),
            remote_addr: "203.0.113.5",
        };

        let outcome = authenticator.authenticate(None, &request, &users);
        assert_that!(outcome, eq(Authentication::Challenge { stale: false }));

        let challenges = authenticator.challenges(request.remote_addr, false);
        let nonce = directive(&challenges[0], "nonce").to_string();
        let opaque = directive(&challenges[0], "opaque").to_string();

        let sha256 = DigestAlgorithm::Sha256;
        let ha1 = sha256.hash_hex(b"alice:api:secret");
        let ha2 = sha256.hash_hex(b"POST:/orders");
        let respond = |nc: &str| {
            let response =
                sha256.hash_hex(format!("{ha1}:{nonce}:{nc}:c0ffee:auth:{ha2}").as_bytes());
            format!(
                r#"Digest username="alice", realm="api", nonce="{nonce}", uri="/orders", algorithm=SHA-256, response="{response}", opaque="{opaque}", qop=auth, nc={nc}, cnonce="c0ffee""#
            )
        };

        let header = respond("00000001");
        assert_that!(
            authenticator.authenticate(Some(&header), &request, &users),
            eq(Authentication::Authenticated {
                username: "alice".into()
            })
        );
        // Replaying the exact same request fails.
        assert_that!(
            authenticator.authenticate(Some(&header), &request, &users),
            eq(Authentication::Challenge { stale: false })
        );
        // The next nonce count is fine.
        assert_that!(
            authenticator.authenticate(Some(&respond("00000002")), &request, &users),
            eq(Authentication::Authenticated {
                username: "alice".into()
            })
        );
    }
}
