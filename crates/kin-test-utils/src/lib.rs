//! Testing utilities for the Kin workspace
//!
//! Shared fixtures, sample trees and scripted layout engines.

#![allow(missing_docs)]

use kin_layout::{EngineGraph, EnginePositions, LayeredEngine, LayoutEngine, LayoutError, LayoutResult, Point};
use kin_model::{Gender, Person, PersonGraph};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Married couple without children
pub const SCENARIO_GEDCOM: &str = "0 HEAD\n\
0 @I1@ INDI\n\
1 NAME John /Smith/\n\
1 SEX M\n\
0 @I2@ INDI\n\
1 NAME Jane /Doe/\n\
1 SEX F\n\
0 @F1@ FAM\n\
1 HUSB @I1@\n\
1 WIFE @I2@\n\
0 TRLR";

/// Two generations with vendor tags, citations and a source record
pub const CUSTOM_TAG_GEDCOM: &str = "0 HEAD\n\
1 SOUR Ancestry\n\
1 GEDC\n\
2 VERS 5.5.1\n\
1 CHAR UTF-8\n\
0 @I1@ INDI\n\
1 NAME John /Smith/\n\
1 SEX M\n\
1 BIRT\n\
2 DATE 1 JAN 1900\n\
2 PLAC Springfield\n\
1 _MILT Navy\n\
2 DATE 1918\n\
1 SOUR @S1@\n\
1 FAMS @F1@\n\
0 @I2@ INDI\n\
1 NAME Mary /Jones/\n\
1 SEX F\n\
1 FAMS @F1@\n\
0 @I3@ INDI\n\
1 NAME Tom /Smith/\n\
1 SEX M\n\
1 FAMC @F1@\n\
1 FAMS @F4@\n\
0 @I4@ INDI\n\
1 NAME Ann /Lee/\n\
1 SEX F\n\
1 FAMS @F4@\n\
0 @I5@ INDI\n\
1 NAME Sue /Smith/\n\
1 SEX F\n\
1 FAMC @F1@\n\
0 @I6@ INDI\n\
1 NAME Kid /Smith/\n\
1 FAMC @F4@\n\
0 @F1@ FAM\n\
1 HUSB @I1@\n\
1 WIFE @I2@\n\
1 CHIL @I3@\n\
1 CHIL @I5@\n\
1 MARR\n\
2 DATE 1925\n\
0 @F4@ FAM\n\
1 HUSB @I3@\n\
1 WIFE @I4@\n\
1 CHIL @I6@\n\
0 @S1@ SOUR\n\
1 TITL Parish register\n\
0 TRLR";

/// Three generations that survive a GEDCOM round trip unchanged
///
/// I1 + I2 → I3, I4; I3 + I5 → I6. I4 is unmarried.
pub fn sample_persons() -> Vec<Person> {
    sample_graph().into_vec()
}

pub fn sample_graph() -> PersonGraph {
    let mut arthur = Person::new("I1", "Arthur")
        .with_last_name("Pendleton")
        .with_gender(Gender::Male)
        .with_birth("12 MAR 1890")
        .with_death("1961");
    arthur.wiki_id = Some("Q1001".into());
    arthur.wiki_loaded = Some(true);

    let mut beatrice = Person::new("I2", "Beatrice")
        .with_last_name("Hale")
        .with_gender(Gender::Female)
        .with_birth("ABT 1893")
        .with_note("Schoolteacher in Leeds");
    beatrice.data.avatar = Some("https://example.org/beatrice.jpg".into());

    let mut cecil = Person::new("I3", "Cecil")
        .with_last_name("Pendleton")
        .with_gender(Gender::Male)
        .with_birth("1915");
    cecil.data.suffix = Some("Jr.".into());

    let mut dora = Person::new("I4", "Dora")
        .with_last_name("Pendleton")
        .with_gender(Gender::Female);
    dora.wiki_loaded = Some(false);

    let evelyn = Person::new("I5", "Evelyn")
        .with_last_name("Marsh")
        .with_gender(Gender::Female);

    let felix = Person::new("I6", "Felix")
        .with_last_name("Pendleton")
        .with_gender(Gender::Unknown)
        .with_note("Twin of an unnamed brother");

    let mut graph: PersonGraph = [arthur, beatrice, cecil, dora, evelyn, felix].into_iter().collect();
    graph.add_spouse("I1", "I2");
    graph.add_child("I3", "I1", Some("I2"));
    graph.add_child("I4", "I1", Some("I2"));
    graph.add_spouse("I3", "I5");
    graph.add_child("I6", "I3", Some("I5"));
    graph
}

/// Person with an id equal to its first name
pub fn person(id: &str, gender: Gender) -> Person {
    Person::new(id, id).with_gender(gender)
}

pub fn positions<'a>(entries: impl IntoIterator<Item = (&'a str, f64, f64)>) -> EnginePositions {
    entries
        .into_iter()
        .map(|(id, x, y)| (id.to_string(), Point::new(x, y)))
        .collect()
}

/// Engine that answers with fixed positions and records every request
#[derive(Debug, Clone, Default)]
pub struct FixedEngine {
    positions: EnginePositions,
    requests: Arc<Mutex<Vec<EngineGraph>>>,
}

impl FixedEngine {
    pub fn new(positions: EnginePositions) -> Self {
        Self {
            positions,
            requests: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<EngineGraph> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait::async_trait]
impl LayoutEngine for FixedEngine {
    async fn layout(&self, graph: EngineGraph) -> LayoutResult<EnginePositions> {
        self.requests.lock().push(graph);
        Ok(self.positions.clone())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Engine that always fails
#[derive(Debug, Clone)]
pub struct FailingEngine {
    message: String,
}

impl FailingEngine {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait::async_trait]
impl LayoutEngine for FailingEngine {
    async fn layout(&self, _graph: EngineGraph) -> LayoutResult<EnginePositions> {
        Err(LayoutError::engine(self.message.clone()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Layered engine whose first request blocks until [`GatedEngine::release`]
#[derive(Debug, Default)]
pub struct GatedEngine {
    calls: AtomicUsize,
    gate: Notify,
}

impl GatedEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl LayoutEngine for GatedEngine {
    async fn layout(&self, graph: EngineGraph) -> LayoutResult<EnginePositions> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.gate.notified().await;
        }
        LayeredEngine.layout_sync(&graph)
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}
