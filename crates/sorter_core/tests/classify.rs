use sorter_core::{classify, detect_terminal, EventStatus, TerminalSignal};

#[test]
fn completion_phrases_and_glyph_classify_as_completed() {
    for raw in [
        "\u{2705} a.jpg \u{2192} 2024-03-01",
        "Processing complete! \u{1F389}",
        "\u{1F389} Processing complete! Ready for download.",
        "Ready for download",
        "\u{2705} Word document saved as 'sorted_receipts_abc.docx'",
    ] {
        assert_eq!(classify(raw), EventStatus::Completed, "{raw}");
    }
}

#[test]
fn failure_markers_classify_as_error() {
    for raw in [
        "\u{274C} Error processing b.jpg: unreadable",
        "OCR ERROR on page 2",
        "Processing failed",
        "\u{274C} Processing failed: corrupt image",
    ] {
        assert_eq!(classify(raw), EventStatus::Error, "{raw}");
    }
}

#[test]
fn other_lines_classify_as_processing() {
    assert_eq!(classify("Sorting receipts..."), EventStatus::Processing);
    assert_eq!(
        classify("\u{23F3} [50%] Processing c.png..."),
        EventStatus::Processing
    );
    assert_eq!(classify(""), EventStatus::Processing);
}

#[test]
fn classification_is_deterministic() {
    let inputs = [
        "Sorting receipts...",
        "Processing complete! \u{1F389}",
        "\u{274C} Processing failed: corrupt image",
        r#"{"type":"file_error","message":"Error processing a.jpg"}"#,
    ];
    for raw in inputs {
        let first = classify(raw);
        for _ in 0..5 {
            assert_eq!(classify(raw), first);
        }
    }
}

#[test]
fn completion_marker_wins_classification_when_both_present() {
    // Classification is advisory; terminal detection applies its own precedence.
    let raw = "\u{2705} Word document saved (1 error skipped)";
    assert_eq!(classify(raw), EventStatus::Completed);
}

#[test]
fn terminal_detection_checks_failure_first() {
    assert_eq!(
        detect_terminal("Processing complete, but processing failed for the export"),
        Some(TerminalSignal::Failure)
    );
    assert_eq!(
        detect_terminal("\u{274C} PROCESSING FAILED: disk full"),
        Some(TerminalSignal::Failure)
    );
    assert_eq!(
        detect_terminal("Processing complete! \u{1F389}"),
        Some(TerminalSignal::Completion)
    );
}

#[test]
fn per_file_errors_are_not_terminal() {
    assert_eq!(
        detect_terminal("\u{274C} Error processing b.jpg: unreadable"),
        None
    );
    assert_eq!(detect_terminal("\u{2705} a.jpg \u{2192} 2024-03-01"), None);
    assert_eq!(detect_terminal("Sorting receipts..."), None);
}

#[test]
fn structured_events_use_their_type() {
    let started = r#"{"type":"started","message":"Processing started","total_files":3}"#;
    let file_error = r#"{"type":"file_error","message":"Error processing a.jpg","error":"blur"}"#;
    let complete = r#"{"type":"complete","message":"Processing complete!","status":"completed"}"#;
    let failed = r#"{"type":"error","message":"Processing failed","error":"boom"}"#;
    let generating = r#"{"type":"generating","message":"Creating Word document"}"#;

    assert_eq!(classify(started), EventStatus::Pending);
    assert_eq!(classify(file_error), EventStatus::Error);
    assert_eq!(classify(complete), EventStatus::Completed);
    assert_eq!(classify(failed), EventStatus::Error);
    assert_eq!(classify(generating), EventStatus::Processing);

    assert_eq!(detect_terminal(file_error), None);
    assert_eq!(detect_terminal(complete), Some(TerminalSignal::Completion));
    assert_eq!(detect_terminal(failed), Some(TerminalSignal::Failure));
}
