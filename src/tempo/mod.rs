// Tempo module - BPM estimation from onsets and named tempo ranges

pub mod cluster;
pub mod marking;

pub use cluster::{
    Clustering, KSelection, TempoClusterer, estimate_bpm, filtered_intervals, kmeans_1d,
};
pub use marking::{TempoMarking, TempoMarkings};
