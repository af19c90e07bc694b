use async_trait::async_trait;
use futures::channel::oneshot;
use futures::executor::block_on;
use ideaboard_core::{
    enrich_note, BoardController, BoardSettings, EnrichmentOutcome, FetchError,
    InMemoryBoardRepository, LinkData, LinkPreviewFetcher,
};
use std::cell::{Cell, RefCell};

type Board = BoardController<InMemoryBoardRepository>;

fn open_board() -> Board {
    BoardController::open(InMemoryBoardRepository::new(), BoardSettings::default()).unwrap()
}

fn preview(url: &str, site_name: &str) -> LinkData {
    LinkData {
        url: url.to_string(),
        title: "Example Domain".to_string(),
        description: "Illustrative example".to_string(),
        image: Some("https://example.com/cover.png".to_string()),
        site_name: site_name.to_string(),
    }
}

/// Answers immediately and records requested urls.
struct RecordingFetcher {
    urls: RefCell<Vec<String>>,
    fail: Cell<bool>,
}

impl RecordingFetcher {
    fn new() -> Self {
        Self {
            urls: RefCell::new(Vec::new()),
            fail: Cell::new(false),
        }
    }

    fn calls(&self) -> usize {
        self.urls.borrow().len()
    }
}

#[async_trait(?Send)]
impl LinkPreviewFetcher for RecordingFetcher {
    async fn fetch(&self, url: &str) -> Result<LinkData, FetchError> {
        self.urls.borrow_mut().push(url.to_string());
        if self.fail.get() {
            return Err(FetchError::Unavailable("connection refused".to_string()));
        }
        Ok(preview(url, "Example"))
    }
}

/// Holds the fetch open until the test releases it.
struct GatedFetcher {
    gate: RefCell<Option<oneshot::Receiver<Result<LinkData, FetchError>>>>,
}

impl GatedFetcher {
    fn new() -> (Self, oneshot::Sender<Result<LinkData, FetchError>>) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                gate: RefCell::new(Some(receiver)),
            },
            sender,
        )
    }
}

#[async_trait(?Send)]
impl LinkPreviewFetcher for GatedFetcher {
    async fn fetch(&self, _url: &str) -> Result<LinkData, FetchError> {
        let receiver = self.gate.borrow_mut().take().unwrap();
        receiver
            .await
            .unwrap_or_else(|_| Err(FetchError::Unavailable("gate dropped".to_string())))
    }
}

fn board_with_note(text: &str) -> (RefCell<Board>, ideaboard_core::NoteId) {
    let mut board = open_board();
    let inbox = board.snapshot().categories()[0].id;
    let (_, note_id) = board.add_note_with_text(inbox, text).unwrap();
    (RefCell::new(board), note_id)
}

#[test]
fn url_note_gets_exactly_one_fetch_and_keeps_text() {
    let (board, note_id) = board_with_note("check https://example.com now");
    let fetcher = RecordingFetcher::new();

    let outcome = block_on(enrich_note(&board, &fetcher, note_id)).unwrap();
    let snapshot = match outcome {
        EnrichmentOutcome::Applied(snapshot) => snapshot,
        other => panic!("unexpected outcome: {other:?}"),
    };
    let note = snapshot.note(note_id).unwrap();
    assert_eq!(note.text, "check https://example.com now");
    assert_eq!(note.link_data.as_ref().unwrap().site_name, "Example");
    assert_eq!(*fetcher.urls.borrow(), vec!["https://example.com".to_string()]);

    let again = block_on(enrich_note(&board, &fetcher, note_id)).unwrap();
    assert_eq!(again, EnrichmentOutcome::Skipped);
    assert_eq!(fetcher.calls(), 1);
}

#[test]
fn note_without_url_is_skipped() {
    let (board, note_id) = board_with_note("just a thought");
    let fetcher = RecordingFetcher::new();

    let outcome = block_on(enrich_note(&board, &fetcher, note_id)).unwrap();
    assert_eq!(outcome, EnrichmentOutcome::Skipped);
    assert_eq!(fetcher.calls(), 0);
}

#[test]
fn failure_is_absorbed_and_not_retried_until_text_changes() {
    let (board, note_id) = board_with_note("read https://example.com/post");
    let fetcher = RecordingFetcher::new();
    fetcher.fail.set(true);

    let outcome = block_on(enrich_note(&board, &fetcher, note_id)).unwrap();
    assert_eq!(outcome, EnrichmentOutcome::Failed);
    assert!(board.borrow().snapshot().note(note_id).unwrap().link_data.is_none());

    let outcome = block_on(enrich_note(&board, &fetcher, note_id)).unwrap();
    assert_eq!(outcome, EnrichmentOutcome::Skipped);
    assert_eq!(fetcher.calls(), 1);

    fetcher.fail.set(false);
    let mut edited = board.borrow().snapshot().note(note_id).unwrap().clone();
    edited.text = "read https://example.com/post again".to_string();
    board.borrow_mut().update_note(edited).unwrap();

    let outcome = block_on(enrich_note(&board, &fetcher, note_id)).unwrap();
    assert!(matches!(outcome, EnrichmentOutcome::Applied(_)));
    assert_eq!(fetcher.calls(), 2);
}

#[test]
fn explicit_retry_allows_second_attempt_for_same_text() {
    let (board, note_id) = board_with_note("https://example.com");
    let fetcher = RecordingFetcher::new();
    fetcher.fail.set(true);
    block_on(enrich_note(&board, &fetcher, note_id)).unwrap();

    fetcher.fail.set(false);
    let request = board
        .borrow_mut()
        .retry_enrichment(note_id)
        .unwrap()
        .expect("retry starts a fetch");
    let result = block_on(fetcher.fetch(request.url()));
    let outcome = board.borrow_mut().apply_preview(&request, result);

    assert!(matches!(outcome, EnrichmentOutcome::Applied(_)));
    assert_eq!(fetcher.calls(), 2);
}

#[test]
fn edit_during_fetch_keeps_new_text_and_still_gets_preview() {
    let (board, note_id) = board_with_note("see https://example.com");
    let (fetcher, release) = GatedFetcher::new();

    let (outcome, ()) = block_on(async {
        futures::join!(enrich_note(&board, &fetcher, note_id), async {
            assert!(board.borrow().is_enrichment_in_flight(note_id));
            assert!(board.borrow_mut().begin_enrichment(note_id).unwrap().is_none());

            let mut edited = board.borrow().snapshot().note(note_id).unwrap().clone();
            edited.text = "see https://example.com and the follow-up".to_string();
            board.borrow_mut().update_note(edited).unwrap();

            release
                .send(Ok(preview("https://example.com", "Example")))
                .unwrap();
        })
    });

    assert!(matches!(outcome.unwrap(), EnrichmentOutcome::Applied(_)));
    let snapshot = board.borrow().snapshot();
    let note = snapshot.note(note_id).unwrap();
    assert_eq!(note.text, "see https://example.com and the follow-up");
    assert_eq!(note.link_data.as_ref().unwrap().url, "https://example.com");
}

#[test]
fn explicit_link_data_set_during_fetch_is_not_overwritten() {
    let (board, note_id) = board_with_note("see https://example.com");
    let (fetcher, release) = GatedFetcher::new();
    let manual = preview("https://example.com", "Hand written");

    let (outcome, ()) = block_on(async {
        futures::join!(enrich_note(&board, &fetcher, note_id), async {
            let mut edited = board.borrow().snapshot().note(note_id).unwrap().clone();
            edited.link_data = Some(manual.clone());
            board.borrow_mut().update_note(edited).unwrap();

            release
                .send(Ok(preview("https://example.com", "Fetched")))
                .unwrap();
        })
    });

    assert_eq!(outcome.unwrap(), EnrichmentOutcome::KeptExisting);
    let snapshot = board.borrow().snapshot();
    assert_eq!(snapshot.note(note_id).unwrap().link_data, Some(manual));
}

#[test]
fn deleting_note_during_fetch_discards_result() {
    let (board, note_id) = board_with_note("see https://example.com");
    let (fetcher, release) = GatedFetcher::new();
    let notes_before = board.borrow().snapshot().notes_len();

    let (outcome, ()) = block_on(async {
        futures::join!(enrich_note(&board, &fetcher, note_id), async {
            board.borrow_mut().request_delete(note_id).unwrap();
            board.borrow_mut().confirm_delete(note_id).unwrap();

            release
                .send(Ok(preview("https://example.com", "Example")))
                .unwrap();
        })
    });

    assert_eq!(outcome.unwrap(), EnrichmentOutcome::Discarded);
    let snapshot = board.borrow().snapshot();
    assert!(snapshot.note(note_id).is_none());
    assert_eq!(snapshot.notes_len(), notes_before - 1);
    assert!(!board.borrow().is_enrichment_in_flight(note_id));
}

#[test]
fn collect_requests_covers_each_url_note_once() {
    let mut board = open_board();
    let inbox = board.snapshot().categories()[0].id;
    let (_, first) = board
        .add_note_with_text(inbox, "https://a.example")
        .unwrap();
    board.add_note_with_text(inbox, "no link here").unwrap();
    let (_, third) = board
        .add_note_with_text(inbox, "also http://b.example/page.")
        .unwrap();

    let requests = board.collect_enrichment_requests();
    let targets: Vec<_> = requests
        .iter()
        .map(|request| (request.note_id(), request.url().to_string()))
        .collect();
    assert_eq!(
        targets,
        vec![
            (first, "https://a.example".to_string()),
            (third, "http://b.example/page".to_string()),
        ]
    );
    assert!(board.collect_enrichment_requests().is_empty());
}
