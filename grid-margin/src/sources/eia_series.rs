use std::sync::Arc;

use async_stream::try_stream;
use eia_client::{
    domain::{HourWindow, Observation, SeriesKind},
    RegionDataClient,
};

use crate::pipeline::{ItemStream, PipelineError, Source};

/// One region-data series over a fixed window, read page by page.
///
/// Pages are requested at offsets 0, n, 2n, ... until a page comes back
/// with fewer than n rows (zero included). Any failed request ends the
/// stream with an error.
pub struct EiaSeriesSource {
    client: Arc<RegionDataClient>,
    kind: SeriesKind,
    window: HourWindow,
}

impl EiaSeriesSource {
    pub fn new(client: Arc<RegionDataClient>, kind: SeriesKind, window: HourWindow) -> Self {
        Self { client, kind, window }
    }
}

#[async_trait::async_trait]
impl Source<Observation> for EiaSeriesSource {
    async fn stream(&self) -> ItemStream<Observation> {
        let client = self.client.clone();
        let kind = self.kind;
        let window = self.window;

        let s = try_stream! {
            let page_size = client.page_size();
            let mut offset = 0usize;
            let mut pages = 0usize;

            loop {
                let page = client
                    .fetch_page(kind, &window, offset)
                    .await
                    .map_err(|e| PipelineError::Source(e.to_string()))?;
                let rows = page.len();
                pages += 1;

                metrics::counter!("eia_pages_fetched_total").increment(1);
                metrics::counter!("eia_rows_fetched_total").increment(rows as u64);

                for obs in page {
                    yield obs;
                }

                if rows < page_size {
                    tracing::info!(series = %kind, pages, rows = offset + rows, "series fetch complete");
                    break;
                }
                offset += page_size;
            }
        };

        Box::pin(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::collect_series;
    use mockito::{Matcher, Server, ServerGuard};
    use std::time::Duration;

    const PATH: &str = "/v2/electricity/rto/region-data/data/";

    fn page_body(start_hour: usize, rows: usize) -> String {
        let data: Vec<serde_json::Value> = (start_hour..start_hour + rows)
            .map(|h| {
                serde_json::json!({
                    "period": format!("2025-09-{:02}T{:02}", 1 + h / 24, h % 24),
                    "respondent": "US48",
                    "type": "D",
                    "value": (1000 + h).to_string(),
                })
            })
            .collect();
        serde_json::json!({ "response": { "data": data } }).to_string()
    }

    fn source(server: &ServerGuard, page_size: usize) -> EiaSeriesSource {
        let client = RegionDataClient::new(format!("{}{PATH}", server.url()), "k", Duration::from_secs(5))
            .unwrap()
            .with_page_size(page_size);
        let window = HourWindow::parse("2025-09-01T00", "2025-09-03T23").unwrap();
        EiaSeriesSource::new(Arc::new(client), SeriesKind::Demand, window)
    }

    async fn mock_page(server: &mut ServerGuard, offset: usize, body: String) -> mockito::Mock {
        server
            .mock("GET", PATH)
            .match_query(Matcher::UrlEncoded("offset".into(), offset.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(1)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn accumulates_pages_until_short_page() {
        let mut server = Server::new_async().await;
        let first = mock_page(&mut server, 0, page_body(0, 3)).await;
        let second = mock_page(&mut server, 3, page_body(3, 3)).await;
        let third = mock_page(&mut server, 6, page_body(6, 2)).await;

        let rows = collect_series(&source(&server, 3)).await.unwrap();

        assert_eq!(rows.len(), 3 + 3 + 2);
        assert_eq!(rows.first().unwrap().value, Some(1000.0));
        assert_eq!(rows.last().unwrap().value, Some(1007.0));
        assert!(rows.windows(2).all(|w| w[0].ts < w[1].ts));
        first.assert_async().await;
        second.assert_async().await;
        third.assert_async().await;
    }

    #[tokio::test]
    async fn full_page_then_empty_page_stops_after_two_calls() {
        let mut server = Server::new_async().await;
        let first = mock_page(&mut server, 0, page_body(0, 4)).await;
        let second = mock_page(&mut server, 4, page_body(0, 0)).await;

        let rows = collect_series(&source(&server, 4)).await.unwrap();

        assert_eq!(rows.len(), 4);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn empty_first_page_yields_nothing() {
        let mut server = Server::new_async().await;
        let only = mock_page(&mut server, 0, r#"{"response":{"data":[]}}"#.to_string()).await;

        let rows = collect_series(&source(&server, 5000)).await.unwrap();

        assert!(rows.is_empty());
        only.assert_async().await;
    }

    #[tokio::test]
    async fn failed_page_aborts_fetch() {
        let mut server = Server::new_async().await;
        let _first = mock_page(&mut server, 0, page_body(0, 2)).await;
        let _failing = server
            .mock("GET", PATH)
            .match_query(Matcher::UrlEncoded("offset".into(), "2".into()))
            .with_status(500)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let res = collect_series(&source(&server, 2)).await;

        assert!(matches!(res, Err(PipelineError::Source(msg)) if msg.contains("500")));
    }
}
