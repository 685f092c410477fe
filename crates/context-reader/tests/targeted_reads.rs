use reason_context_reader::{
    assemble_context, read_many, AnalysisTarget, FileReadRequest, Priority,
};
use tempfile::TempDir;

#[tokio::test]
async fn mixed_mode_batch_reads_agree_with_full_reads() {
    let dir = TempDir::new().expect("tempdir");
    let content: String = (1..=500)
        .map(|i| format!("entry {i}"))
        .collect::<Vec<_>>()
        .join("\n");
    tokio::fs::write(dir.path().join("data.txt"), &content)
        .await
        .unwrap();

    let requests = vec![
        FileReadRequest::full("data.txt"),
        FileReadRequest::head("data.txt", 10),
        FileReadRequest::tail("data.txt", 10),
        FileReadRequest::range("data.txt", 100, 110),
    ];
    let results = read_many(Some(dir.path()), &requests).await;
    assert!(results.iter().all(|r| r.success));

    let full_lines: Vec<&str> = results[0].content.as_deref().unwrap().split('\n').collect();
    assert_eq!(
        results[1].content.as_deref().unwrap(),
        full_lines[..10].join("\n")
    );
    assert_eq!(
        results[2].content.as_deref().unwrap(),
        full_lines[490..].join("\n")
    );
    assert_eq!(
        results[3].content.as_deref().unwrap(),
        full_lines[99..110].join("\n")
    );
}

#[tokio::test]
async fn assembled_context_reads_buckets_in_order_with_partial_failures() {
    let dir = TempDir::new().expect("tempdir");
    tokio::fs::write(dir.path().join("brief.md"), "the brief body")
        .await
        .unwrap();
    tokio::fs::write(dir.path().join("notes.md"), "side notes")
        .await
        .unwrap();

    let targets = vec![
        AnalysisTarget {
            request: FileReadRequest::full("notes.md"),
            priority: Priority::Supplementary,
        },
        AnalysisTarget {
            request: FileReadRequest::full("brief.md"),
            priority: Priority::Critical,
        },
        AnalysisTarget {
            request: FileReadRequest::full("gone.md"),
            priority: Priority::Important,
        },
    ];

    let assembled = assemble_context(&targets, dir.path(), None).await;
    let brief_pos = assembled.content.find("=== brief.md").unwrap();
    let gone_pos = assembled.content.find("=== gone.md").unwrap();
    let notes_pos = assembled.content.find("=== notes.md").unwrap();
    assert!(brief_pos < gone_pos && gone_pos < notes_pos);
    assert_eq!(assembled.files_analyzed, 2);
}
