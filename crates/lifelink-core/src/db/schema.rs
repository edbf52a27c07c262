//! SQLite schema definition.

/// Complete database schema for LifeLink.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    blood_type TEXT NOT NULL,                    -- unchecked; validated at match time
    longitude REAL NOT NULL,
    latitude REAL NOT NULL,
    urgency TEXT,                                -- Critical | High | Medium | Low
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Donors
-- ============================================================================

CREATE TABLE IF NOT EXISTS donors (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    phone TEXT UNIQUE,
    blood_type TEXT NOT NULL,
    longitude REAL NOT NULL,
    latitude REAL NOT NULL,
    verified INTEGER NOT NULL DEFAULT 0,
    otp_verified INTEGER NOT NULL DEFAULT 0,
    availability INTEGER NOT NULL DEFAULT 1,
    points INTEGER NOT NULL DEFAULT 0,
    badges TEXT NOT NULL DEFAULT '[]',           -- JSON array of {name, description}
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Latitude band prefilter for proximity queries
CREATE INDEX IF NOT EXISTS idx_donors_latitude ON donors(latitude);
CREATE INDEX IF NOT EXISTS idx_donors_eligibility
    ON donors(verified, otp_verified, availability, blood_type);

-- ============================================================================
-- Donation Requests
-- ============================================================================

CREATE TABLE IF NOT EXISTS donation_requests (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id),
    donor_id TEXT NOT NULL REFERENCES donors(id),
    status TEXT NOT NULL DEFAULT 'Pending'
        CHECK (status IN ('Pending', 'Accepted', 'Rejected', 'Completed', 'Cancelled')),
    requested_at TEXT NOT NULL,
    responded_at TEXT,
    completed_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_requests_donor_status ON donation_requests(donor_id, status);
"#;
