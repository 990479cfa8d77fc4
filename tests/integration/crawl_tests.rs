//! Integration tests for the crawler
//!
//! These tests use wiremock to stand up a fake Fakebook over plain HTTP and
//! run the full login and crawl cycle end-to-end.

use fakebook_crawler::config::Config;
use fakebook_crawler::crawler::run_crawl;
use fakebook_crawler::output::write_flags;
use fakebook_crawler::state::Termination;
use fakebook_crawler::CrawlError;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FORM_TOKEN: &str = "f0rmT0k3n";
const CSRF_AFTER_LOGIN: &str = "csrf-after-login";
const SESSION_ID: &str = "s3ss10n";

/// Creates a plain-HTTP configuration pointing at the mock server
fn create_test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.server.host = server.address().ip().to_string();
    config.server.port = server.address().port();
    config.server.tls = false;
    config.credentials.username = "alice".to_string();
    config.credentials.password = "hunter2".to_string();
    config.crawler.max_attempts = 3;
    config.crawler.retry_delay_ms = 10;
    config.crawler.connect_timeout_ms = 2000;
    config.crawler.read_timeout_ms = 2000;
    config
}

fn flag(c: char) -> String {
    std::iter::repeat(c).take(64).collect()
}

fn page(links: &[&str], flags: &[&str]) -> String {
    let mut html = String::from("<html><body>");
    for link in links {
        html.push_str(&format!(r#"<a href="{}">friend</a>"#, link));
    }
    for value in flags {
        html.push_str(&format!(
            r#"<h3 class='secret_flag' style="color:red">FLAG: {}</h3>"#,
            value
        ));
    }
    html.push_str("</body></html>");
    html
}

/// Mounts the login form and the credential check
async fn mount_login(server: &MockServer) {
    let form = format!(
        r#"<form method="post"><input type="hidden" name="csrfmiddlewaretoken" value="{}">
        <input name="username"><input type="password" name="password"></form>"#,
        FORM_TOKEN
    );

    Mock::given(method("GET"))
        .and(path("/accounts/login/"))
        .and(query_param("next", "/fakebook/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "csrftoken=csrf-before-login; Path=/")
                .set_body_string(form),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/accounts/login/"))
        .and(header("cookie", "csrftoken=csrf-before-login"))
        .and(body_string_contains(format!(
            "csrfmiddlewaretoken={}",
            FORM_TOKEN
        )))
        .and(body_string_contains("username=alice"))
        .and(body_string_contains("password=hunter2"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "/fakebook/")
                .append_header(
                    "Set-Cookie",
                    format!("csrftoken={}; Path=/", CSRF_AFTER_LOGIN).as_str(),
                )
                .append_header(
                    "Set-Cookie",
                    format!("sessionid={}; HttpOnly; Path=/", SESSION_ID).as_str(),
                ),
        )
        .expect(1)
        .mount(server)
        .await;
}

/// Mounts a page that is only served to a logged-in session
async fn mount_page(server: &MockServer, page_path: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .and(header(
            "cookie",
            format!("csrftoken={}; sessionid={}", CSRF_AFTER_LOGIN, SESSION_ID).as_str(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_three_node_site_reports_incomplete_result() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server).await;

    let (a, b, c) = (flag('a'), flag('b'), flag('c'));
    mount_page(
        &mock_server,
        "/fakebook/",
        page(&["/fakebook/a/", "/fakebook/b/"], &[]),
    )
    .await;
    mount_page(&mock_server, "/fakebook/a/", page(&["/fakebook/c/"], &[&a])).await;
    mount_page(&mock_server, "/fakebook/b/", page(&["/fakebook/a/"], &[&b])).await;
    mount_page(&mock_server, "/fakebook/c/", page(&["/fakebook/"], &[&c])).await;

    let report = run_crawl(create_test_config(&mock_server))
        .await
        .expect("crawl should finish");

    assert_eq!(report.flags, vec![a.clone(), b.clone(), c.clone()]);
    assert_eq!(report.termination, Termination::FrontierExhausted);
    assert_eq!(report.statistics.pages_fetched, 4);
    assert!(matches!(
        report.verify(),
        Err(CrawlError::IncompleteResult {
            found: 3,
            expected: 5
        })
    ));

    let mut out = Vec::new();
    write_flags(&report, &mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        format!("ERROR\n{}\n{}\n{}\n", a, b, c)
    );
}

#[tokio::test]
async fn test_crawl_stops_at_five_flags() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server).await;

    mount_page(
        &mock_server,
        "/fakebook/",
        page(&["/fakebook/1/", "/fakebook/2/"], &[&flag('0')]),
    )
    .await;
    mount_page(
        &mock_server,
        "/fakebook/1/",
        page(&["/fakebook/3/"], &[&flag('1'), &flag('2')]),
    )
    .await;
    mount_page(
        &mock_server,
        "/fakebook/2/",
        page(&["/fakebook/4/"], &[&flag('3'), &flag('4')]),
    )
    .await;

    // Never reached: the target is met after /fakebook/2/
    for unreached in ["/fakebook/3/", "/fakebook/4/"] {
        Mock::given(method("GET"))
            .and(path(unreached))
            .respond_with(ResponseTemplate::new(200).set_body_string(page(&[], &[&flag('x')])))
            .expect(0)
            .mount(&mock_server)
            .await;
    }

    let report = run_crawl(create_test_config(&mock_server))
        .await
        .expect("crawl should finish");

    assert_eq!(report.termination, Termination::TargetReached);
    let flags = report.verify().expect("exactly five flags");
    assert_eq!(
        flags,
        &[flag('0'), flag('1'), flag('2'), flag('3'), flag('4')]
    );
}

#[tokio::test]
async fn test_login_page_without_token_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/accounts/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>down for maintenance</html>"))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(302))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = run_crawl(create_test_config(&mock_server))
        .await
        .expect_err("login must fail");
    assert!(matches!(err, CrawlError::LoginFormParseFailure { .. }));
}
