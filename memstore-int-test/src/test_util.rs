use memstore::collection::{Document, FieldType, ModelDefinition};
use memstore::common::Value;
use memstore::doc;
use memstore::errors::StoreResult;
use memstore::geo::GeoPoint;
use memstore::MemoryStore;
use std::path::{Path, PathBuf};
use std::time::Instant;
use std::{env, fs};

/// Runs `test` on the context built by `before`, always running `after`.
/// Panics with the failing stage and error so the test harness reports it.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> StoreResult<()>,
    B: Fn() -> StoreResult<TestContext>,
    A: Fn(TestContext) -> StoreResult<()>,
{
    let start = Instant::now();
    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| test(ctx.clone())));
    let after_result = after(ctx);

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => panic!("Test failed after {:?}: {:?}", start.elapsed(), e),
        Err(panic) => std::panic::resume_unwind(panic),
    }
    if let Err(e) = after_result {
        panic!("After run failed: {:?}", e);
    }
}

#[derive(Clone)]
pub struct TestContext {
    path: PathBuf,
    store: MemoryStore,
}

impl TestContext {
    pub fn new(path: PathBuf, store: MemoryStore) -> Self {
        Self { path, store }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> MemoryStore {
        self.store.clone()
    }
}

/// A fresh file path in the system temp directory. The file does not exist.
pub fn random_path() -> PathBuf {
    let id = uuid::Uuid::new_v4();
    env::temp_dir().join(format!("memstore-{}.json", id))
}

/// The model the seed data belongs to.
pub fn user_model() -> ModelDefinition {
    ModelDefinition::new("User")
        .property("name", FieldType::String)
        .property("seq", FieldType::Number)
        .property("vip", FieldType::Boolean)
        .property("birthday", FieldType::Date)
        .property("location", FieldType::Object)
}

pub fn create_test_context() -> StoreResult<TestContext> {
    let path = random_path();
    let store = MemoryStore::builder()
        .file(&path)
        .define_model(user_model())
        .open()?;
    Ok(TestContext::new(path, store))
}

pub fn cleanup(ctx: TestContext) -> StoreResult<()> {
    if !ctx.store().is_closed() {
        ctx.store().close()?;
    }
    for file in [ctx.path().to_path_buf(), ctx.path().with_extension("json.tmp")] {
        if file.exists() {
            if let Err(e) = fs::remove_file(&file) {
                eprintln!("Warning: Failed to remove {}: {:?}", file.display(), e);
            }
        }
    }
    Ok(())
}

/// Six users with `seq` 0 to 5, ids 1 to 6. Pete Best has neither a `vip`
/// flag nor a location.
pub fn beatles() -> Vec<Document> {
    vec![
        doc! {
            seq: 0,
            name: "John Lennon",
            email: "john@b3atl3s.co.uk",
            role: "lead",
            birthday: "1980-12-08T00:00:00.000Z",
            vip: true,
            location: { lat: 53.4084, lng: (-2.9916) },
        },
        doc! {
            seq: 1,
            name: "Paul McCartney",
            email: "paul@b3atl3s.co.uk",
            role: "lead",
            birthday: "1942-06-18T00:00:00.000Z",
            vip: true,
            location: { lat: 53.3887, lng: (-2.9170) },
        },
        doc! {
            seq: 2,
            name: "George Harrison",
            birthday: "1943-02-25T00:00:00.000Z",
            vip: false,
            location: { lat: 53.3812, lng: (-2.8813) },
        },
        doc! {
            seq: 3,
            name: "Ringo Starr",
            birthday: "1940-07-07T00:00:00.000Z",
            vip: false,
            location: { lat: 53.3970, lng: (-2.9580) },
        },
        doc! {
            seq: 4,
            name: "Pete Best",
            birthday: "1941-11-24T00:00:00.000Z",
        },
        doc! {
            seq: 5,
            name: "Stuart Sutcliffe",
            birthday: "1940-06-23T00:00:00.000Z",
            vip: true,
            location: { lat: 55.8642, lng: (-4.2518) },
        },
    ]
}

pub fn seed_beatles(store: &MemoryStore) -> StoreResult<()> {
    for user in beatles() {
        store.create("User", user)?.wait()?;
    }
    Ok(())
}

/// Reads a string field from every document.
pub fn names(documents: &[Document]) -> Vec<String> {
    documents
        .iter()
        .filter_map(|doc| doc.get("name").and_then(Value::as_str).map(str::to_string))
        .collect()
}

pub fn seqs(documents: &[Document]) -> Vec<i64> {
    documents
        .iter()
        .filter_map(|doc| doc.get("seq").and_then(Value::as_i64))
        .collect()
}

pub fn point(lat: f64, lng: f64) -> StoreResult<GeoPoint> {
    GeoPoint::new(lat, lng)
}
