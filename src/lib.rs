// ==============================================================================
// lib.rs - BioAssay Kit Library
// ==============================================================================
// Description: Microarray BioAssay object model, file formats and scripting API
// Created: 2025-11-03
// Modified: 2026-01-17
// Version: 2.0.0
// ==============================================================================

pub mod models;
pub mod formats;
pub mod genepix;
pub mod parsers;
pub mod output;
pub mod translator;
pub mod biolist;
pub mod filters;
pub mod sorter;
pub mod bioassay_utils;
pub mod scripting;
pub mod processor;
