// skid Copyright (c) 2026 skid contributors.
// Licensed under the MIT License.
// See LICENSE file in repository root for complete license text.

pub mod bot;
pub mod drive;
pub mod field;
pub mod motor;
pub mod panel;
pub mod serial;
pub mod sim;
pub mod sticks;
