#![allow(non_snake_case)]

// Базовые модули
pub mod consts;
pub mod config;
pub mod flags;
pub mod element;
pub mod metrics;

// Разбиение домена и группы процессов
pub mod partition; // src/partition.rs
pub mod comm;      // src/comm/{mod,group}.rs

// Хранилище страниц (внешний адаптер)
pub mod store;     // src/store/{mod,mem,dir,tiered}.rs

// Кэш страниц и транзакции
pub mod vector;    // src/vector/{mod,page,cache,sort}.rs
pub mod tx;        // src/tx/{mod,stream,seq,random}.rs

// Удобные реэкспорты
pub use comm::{Communicator, SoloComm, ThreadComm, ThreadGroup};
pub use config::{MegaConfig, VecBuilder};
pub use element::Element;
pub use flags::AccessFlags;
pub use partition::{bisect, even_pgas, even_pgas_window, LocalRange, ProcRange};
pub use store::{BlobStore, Bucket, DirStore, MemStore, TieredStore};
pub use tx::{DrawStream, PageGeometry, PageHints, RandPattern, SeqPattern, Tx, TxPattern};
pub use vector::MegaVec;
