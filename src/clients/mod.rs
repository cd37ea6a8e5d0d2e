pub mod notebooklm;
