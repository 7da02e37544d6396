//! Finding the documents to process.

use crate::prelude::*;

pub mod s3;

/// The file suffix we look for. Matched literally and case-sensitively, so
/// `CV.PDF` is not picked up.
const PDF_SUFFIX: &str = ".pdf";

/// One source document inside a storage container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentRef {
    /// The container (S3 bucket) holding the document.
    pub container: String,

    /// The object key within the container.
    pub key: String,
}

/// Interface to an object store.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// List the object keys in `container`.
    ///
    /// Only the first listing page is returned. Containers with more objects
    /// than fit on one page will have the rest silently omitted.
    async fn list_keys(&self, container: &str) -> Result<Vec<String>>;
}

/// List the PDF documents in `container`, in listing order.
#[instrument(level = "debug", skip(store))]
pub async fn list_pdf_documents(
    store: &dyn DocumentStore,
    container: &str,
) -> Result<Vec<DocumentRef>> {
    let keys = store
        .list_keys(container)
        .await
        .with_context(|| format!("failed to list objects in {container:?}"))?;
    let total = keys.len();
    let documents = keys
        .into_iter()
        .filter(|key| key.ends_with(PDF_SUFFIX))
        .map(|key| DocumentRef {
            container: container.to_owned(),
            key,
        })
        .collect::<Vec<_>>();
    debug!(total, pdfs = documents.len(), "Listed objects");
    Ok(documents)
}


#[cfg(test)]
mod tests {
    use super::{fake::FakeStore, *};

    #[tokio::test]
    async fn keeps_only_lowercase_pdf_suffix() -> Result<()> {
        let store = FakeStore::default().with_container(
            "cvs",
            &["a.pdf", "b.PDF", "notes.txt", "dir/c.pdf", "d.pdf.bak"],
        );
        let docs = list_pdf_documents(&store, "cvs").await?;
        let keys = docs.iter().map(|d| d.key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, ["a.pdf", "dir/c.pdf"]);
        assert!(docs.iter().all(|d| d.container == "cvs"));
        Ok(())
    }

    #[tokio::test]
    async fn empty_container_lists_nothing() -> Result<()> {
        let store = FakeStore::default().with_container("empty", &[]);
        assert!(list_pdf_documents(&store, "empty").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn listing_failure_is_an_error() {
        let store = FakeStore::default();
        let err = list_pdf_documents(&store, "missing").await.unwrap_err();
        assert!(err.to_string().contains("missing"));
    }
}
