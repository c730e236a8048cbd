use super::*;

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

fn uri() -> ResourceUri {
    ResourceUri::for_model("unit", LanguageId::TypeScript)
}

#[test]
fn open_and_change_refresh_syntax_markers() {
    let service = TreeSitterLanguageService::new();
    let uri = uri();

    service.open(uri.clone(), LanguageId::TypeScript, "let x = 1;".to_string());
    assert!(service.markers(&uri).is_empty());

    service.did_change(&uri, 1, "let = ;".to_string());
    assert!(!service.markers(&uri).is_empty());

    service.did_change(&uri, 2, "let y = 2;".to_string());
    assert!(service.markers(&uri).is_empty());
    assert_eq!(service.document_version(&uri), Some(2));
}

#[test]
fn stale_changes_are_ignored() {
    let service = TreeSitterLanguageService::new();
    let uri = uri();

    service.open(uri.clone(), LanguageId::TypeScript, String::new());
    service.did_change(&uri, 5, "let a = 1;".to_string());
    service.did_change(&uri, 3, "let = ;".to_string());

    assert_eq!(service.document_version(&uri), Some(5));
    assert!(service.markers(&uri).is_empty());
}

#[test]
fn external_markers_survive_syntax_refresh() {
    let service = TreeSitterLanguageService::new();
    let uri = uri();

    service.open(uri.clone(), LanguageId::TypeScript, "1+1".to_string());
    service.set_markers(&uri, "lint", vec![Marker::error(3, 1, "message M")]);
    service.did_change(&uri, 1, "2+2".to_string());

    let markers = service.markers(&uri);
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].message, "message M");
}

#[test]
fn close_forgets_document_and_markers() {
    let service = TreeSitterLanguageService::new();
    let uri = uri();

    service.open(uri.clone(), LanguageId::TypeScript, "let = ;".to_string());
    service.close(&uri);

    assert!(service.markers(&uri).is_empty());
    assert!(service.document_version(&uri).is_none());
}

#[test]
fn worker_emits_javascript_for_current_text() {
    let service = TreeSitterLanguageService::new();
    let uri = uri();
    service.open(uri.clone(), LanguageId::TypeScript, "let x: number = 1;".to_string());

    let output = block_on(async {
        let worker = service.worker().await.unwrap();
        worker.emit_output(&uri).await.unwrap()
    });

    assert_eq!(output.primary_text(), Some("let x = 1;"));
    assert_eq!(output.output_files[0].name, "inmemory://model/unit.js");
    assert_eq!(service.emit_request_count(), 1);
}

#[test]
fn worker_rejects_unknown_resource() {
    let service = TreeSitterLanguageService::new();
    let missing = ResourceUri::new("inmemory://model/missing.ts");

    let err = block_on(async {
        let worker = service.worker().await.unwrap();
        worker.emit_output(&missing).await.unwrap_err()
    });

    assert_eq!(err, LanguageError::UnknownResource(missing));
}
