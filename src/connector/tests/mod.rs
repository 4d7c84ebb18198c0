//! Unit tests for connector domain transitions and service orchestration.
