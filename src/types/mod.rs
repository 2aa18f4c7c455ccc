// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod enums;
pub mod hash;
pub mod reference;

pub use enums::Layer;
pub use hash::Hash256;
pub use reference::Reference;
