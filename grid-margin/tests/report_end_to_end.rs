use grid_margin::{config::AppConfig, run_report};
use mockito::{Matcher, Server, ServerGuard};

const PATH: &str = "/v2/electricity/rto/region-data/data/";

async fn mock_series(server: &mut ServerGuard, facet: &str, body: &str) -> mockito::Mock {
    server
        .mock("GET", PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("facets[type][]".into(), facet.into()),
            Matcher::UrlEncoded("api_key".into(), "e2e-key".into()),
            Matcher::UrlEncoded("offset".into(), "0".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(1)
        .create_async()
        .await
}

fn config(server: &ServerGuard, out_dir: &std::path::Path) -> AppConfig {
    let toml = format!(
        r#"
        [eia]
        base_url = "{}{PATH}"
        api_key = "e2e-key"
        timeout_secs = 5

        [window]
        start = "2025-09-01T00"
        end = "2025-09-01T01"

        [output]
        dir = "{}"
        "#,
        server.url(),
        out_dir.display()
    );
    AppConfig::from_toml_str(&toml).unwrap()
}

#[tokio::test]
async fn two_hour_run_flags_tight_hour() {
    let mut server = Server::new_async().await;
    // Hour 0 is reported twice for demand; the first reading wins.
    let demand = mock_series(
        &mut server,
        "D",
        r#"{"response":{"data":[
            {"period":"2025-09-01T00","type":"D","value":"100"},
            {"period":"2025-09-01T00","type":"D","value":"105"},
            {"period":"2025-09-01T01","type":"D","value":"120"}
        ]}}"#,
    )
    .await;
    let generation = mock_series(
        &mut server,
        "NG",
        r#"{"response":{"data":[
            {"period":"2025-09-01T00","type":"NG","value":150},
            {"period":"2025-09-01T01","type":"NG","value":125}
        ]}}"#,
    )
    .await;

    let out = tempfile::tempdir().unwrap();
    let report = run_report(&config(&server, out.path())).await.unwrap();

    demand.assert_async().await;
    generation.assert_async().await;

    let flags: Vec<bool> = report.hourly.iter().map(|r| r.near_capacity).collect();
    assert_eq!(flags, vec![false, true]);

    let hourly = std::fs::read_to_string(out.path().join("hourly_demand_generation.csv")).unwrap();
    assert_eq!(
        hourly,
        "datetime,D,NG,Diff,Day,Hour,CloseToLimit\n\
         2025-09-01 00:00:00,100.0,150.0,50.0,2025-09-01,0,False\n\
         2025-09-01 01:00:00,120.0,125.0,5.0,2025-09-01,1,True\n"
    );

    let daily = std::fs::read_to_string(out.path().join("daily_totals.csv")).unwrap();
    assert_eq!(daily, "datetime,D,NG,Diff\n2025-09-01,220.0,275.0,55.0\n");

    let events = std::fs::read_to_string(out.path().join("high_demand_events.csv")).unwrap();
    assert_eq!(
        events,
        "datetime,D,NG,Diff,Day,Hour,CloseToLimit\n\
         2025-09-01 01:00:00,120.0,125.0,5.0,2025-09-01,1,True\n"
    );
}

#[tokio::test]
async fn http_failure_aborts_before_any_output() {
    let mut server = Server::new_async().await;
    let _denied = server
        .mock("GET", PATH)
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body(r#"{"error":"API_KEY_INVALID"}"#)
        .create_async()
        .await;

    let out = tempfile::tempdir().unwrap();
    let res = run_report(&config(&server, out.path())).await;

    assert!(res.is_err());
    assert!(!out.path().join("hourly_demand_generation.csv").exists());
}
