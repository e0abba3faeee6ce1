pub mod core;
pub mod analysis;
pub mod index;
pub mod scoring;
pub mod query;
pub mod search;
pub mod ltr;

/*
┌──────────────────────────────────── RANQX ARCHITECTURE ────────────────────────────────────┐
│                                                                                             │
│   query text ──► QueryParser (nom) ──► QueryNode tree                                       │
│                        │                     │                                              │
│                    Analyzer            EvalContext::evaluate(model)                          │
│                 (tokenize, stop,             │                                              │
│                      stem)        ┌──────────┴───────────┐                                  │
│                                   ▼                      ▼                                  │
│                     QueryResult::Inverted      QueryResult::Scores                          │
│                     (TERM SYN NEAR WINDOW)     (AND OR SUM WAND WSUM SCORE)                  │
│                                   │                      │                                  │
│                                   └──── #SCORE coerce ───┘                                  │
│                                              │                                              │
│                                              ▼                                              │
│   QueryEngine ──► TopNCollector ──► trec::write_ranking                                     │
│       │                                                                                     │
│       └── FeedbackExpander (indri): rank, expand, rank again                                │
│                                                                                             │
│   LearnToRank ──► FeatureExtractor ──► FeatureVector::normalize ──► SvmRankTrainer          │
│                                                                                             │
│   Every component reads the collection through the PostingStore trait                       │
│   (MemoryIndex in-process), statistics cached in CollectionStats.                           │
│                                                                                             │
└─────────────────────────────────────────────────────────────────────────────────────────────┘
*/
