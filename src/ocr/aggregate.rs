//! Collecting job results.

use crate::{errors::DocumentError, prelude::*};

use super::{DetectionKind, JobHandle, OcrService, ResultPage};

/// Fetch every result page for a finished job, in token-chain order.
///
/// The first page is always fetched. After that, we keep following
/// `next_token` until a page comes back without one. There is no page limit,
/// so a service that hands out tokens forever will keep us here forever.
#[instrument(level = "debug", skip(ocr), fields(job = %job))]
pub async fn fetch_all_pages(
    ocr: &dyn OcrService,
    job: &JobHandle,
) -> Result<Vec<ResultPage>, DocumentError> {
    let mut pages: Vec<ResultPage> = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let page_index = pages.len();
        let page = ocr
            .fetch_page(job, token.as_deref())
            .await
            .map_err(|err| with_page_index(err, page_index))?;
        trace!(
            page_index,
            detections = page.detections.len(),
            "Fetched result page"
        );

        // An empty token means the same thing as a missing one.
        token = page.next_token.clone().filter(|t| !t.is_empty());
        pages.push(page);
        if token.is_none() {
            break;
        }
    }
    debug!(pages = pages.len(), "Fetched all result pages");
    Ok(pages)
}

/// Make sure aggregation errors report where in the chain they happened.
fn with_page_index(err: DocumentError, page_index: usize) -> DocumentError {
    match err {
        DocumentError::Aggregation {
            job_id, message, ..
        } => DocumentError::Aggregation {
            job_id,
            page_index,
            message,
        },
        other => other,
    }
}

/// Join the text of every line detection, page by page, with newlines.
///
/// Word-level and other detections are skipped, since their text is already
/// part of some line.
pub fn flatten_lines(pages: &[ResultPage]) -> String {
    pages
        .iter()
        .flat_map(|page| &page.detections)
        .filter(|detection| detection.kind == DetectionKind::Line)
        .filter_map(|detection| detection.text.as_deref())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ocr::{
            Detection,
            fake::{Call, FakeOcr, Script},
        },
        storage::DocumentRef,
    };

    fn page(lines: &[&str], next_token: Option<&str>) -> ResultPage {
        ResultPage {
            detections: lines.iter().map(|&l| Detection::line(l)).collect(),
            next_token: next_token.map(str::to_owned),
        }
    }

    async fn submit(ocr: &FakeOcr, key: &str) -> JobHandle {
        ocr.submit(&DocumentRef {
            container: "cvs".to_owned(),
            key: key.to_owned(),
        })
        .await
        .unwrap()
    }

    #[test]
    fn flattens_pages_in_order() {
        let pages = [page(&["A", "B"], Some("t1")), page(&["C"], None)];
        assert_eq!(flatten_lines(&pages), "A\nB\nC");
    }

    #[test]
    fn flatten_skips_words_and_textless_blocks() {
        let pages = [ResultPage {
            detections: vec![
                Detection {
                    kind: DetectionKind::Other,
                    text: None,
                },
                Detection::line("Jane Doe"),
                Detection::word("Jane"),
                Detection::word("Doe"),
                Detection {
                    kind: DetectionKind::Line,
                    text: None,
                },
                Detection::line("Paris"),
            ],
            next_token: None,
        }];
        assert_eq!(flatten_lines(&pages), "Jane Doe\nParis");
    }

    #[test]
    fn flatten_of_nothing_is_empty() {
        assert_eq!(flatten_lines(&[]), "");
        assert_eq!(flatten_lines(&[ResultPage::default()]), "");
    }

    #[tokio::test]
    async fn follows_tokens_until_absent() {
        let ocr = FakeOcr::default().with_script(
            "a.pdf",
            Script::succeeds_with(vec![
                vec![Detection::line("one")],
                vec![Detection::line("two")],
                vec![Detection::line("three")],
            ]),
        );
        let job = submit(&ocr, "a.pdf").await;
        let pages = fetch_all_pages(&ocr, &job).await.unwrap();
        assert_eq!(flatten_lines(&pages), "one\ntwo\nthree");
        assert_eq!(pages.last().unwrap().next_token, None);

        let fetches = ocr
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Fetch(_, token) => Some(token),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(
            fetches,
            [None, Some("t1".to_owned()), Some("t2".to_owned())]
        );
    }

    #[tokio::test]
    async fn always_fetches_the_first_page() {
        let ocr = FakeOcr::default().with_script("empty.pdf", Script::succeeds_with(vec![]));
        let job = submit(&ocr, "empty.pdf").await;
        let pages = fetch_all_pages(&ocr, &job).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(ocr.fetch_call_count(), 1);
        assert_eq!(flatten_lines(&pages), "");
    }

    #[tokio::test]
    async fn failing_fetch_aborts_with_page_index() {
        let ocr = FakeOcr::default().with_script(
            "a.pdf",
            Script {
                fail_page: Some(1),
                ..Script::succeeds_with(vec![
                    vec![Detection::line("one")],
                    vec![Detection::line("two")],
                    vec![Detection::line("three")],
                ])
            },
        );
        let job = submit(&ocr, "a.pdf").await;
        let err = fetch_all_pages(&ocr, &job).await.unwrap_err();
        assert!(matches!(
            err,
            DocumentError::Aggregation { page_index: 1, .. }
        ));
        assert_eq!(ocr.fetch_call_count(), 2);
    }

    #[tokio::test]
    async fn empty_token_ends_the_chain() {
        let ocr = FakeOcr::default().with_script(
            "a.pdf",
            Script {
                empty_final_token: true,
                ..Script::succeeds_with(vec![vec![Detection::line("only")]])
            },
        );
        let job = submit(&ocr, "a.pdf").await;
        let pages = fetch_all_pages(&ocr, &job).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].next_token.as_deref(), Some(""));
        assert_eq!(ocr.fetch_call_count(), 1);
        assert_eq!(flatten_lines(&pages), "only");
    }
}
