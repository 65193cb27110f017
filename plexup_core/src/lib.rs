/*============================================================
  Synavera Project: Plex-Up
  Module: plexup_core
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Library surface for Plex-Up Core: checks a local Plex Media
    Server for pending updates, downloads the package, and
    applies it through the host package manager.

  Security / Safety Notes:
    Privileged execution is confined to the installer module.

  Dependencies:
    See individual modules.

  Operational Scope:
    Consumed by the `plexup` binary and integration tests.

  Revision History:
    2025-11-02 COD  Split library from binary entry point.
============================================================*/

pub mod config;
pub mod error;
pub mod fetcher;
pub mod installer;
pub mod logger;
pub mod orchestrator;
pub mod status;
pub mod update_info;
