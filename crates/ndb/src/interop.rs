// NDB - Neo Debugger
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Names of NeoVM interop services.
//!
//! A hashed `SYSCALL` carries the first four bytes of the SHA-256 digest of
//! the service name, read as a little-endian integer. The table is computed
//! from the names at startup.

use std::collections::HashMap;

use ndb_engine::disasm::SyscallResolver;
use sha2::{Digest, Sha256};

/// Interop services registered by the Neo 2.x runtime
pub const KNOWN_INTEROP_NAMES: &[&str] = &[
    "System.ExecutionEngine.GetScriptContainer",
    "System.ExecutionEngine.GetExecutingScriptHash",
    "System.ExecutionEngine.GetCallingScriptHash",
    "System.ExecutionEngine.GetEntryScriptHash",
    "System.Runtime.Platform",
    "System.Runtime.GetTrigger",
    "System.Runtime.CheckWitness",
    "System.Runtime.Notify",
    "System.Runtime.Log",
    "System.Runtime.GetTime",
    "System.Runtime.Serialize",
    "System.Runtime.Deserialize",
    "System.Blockchain.GetHeight",
    "System.Blockchain.GetHeader",
    "System.Blockchain.GetBlock",
    "System.Blockchain.GetTransaction",
    "System.Blockchain.GetTransactionHeight",
    "System.Blockchain.GetContract",
    "System.Header.GetIndex",
    "System.Header.GetHash",
    "System.Header.GetPrevHash",
    "System.Header.GetTimestamp",
    "System.Block.GetTransactionCount",
    "System.Block.GetTransactions",
    "System.Block.GetTransaction",
    "System.Transaction.GetHash",
    "System.Contract.Destroy",
    "System.Contract.GetStorageContext",
    "System.Storage.GetContext",
    "System.Storage.GetReadOnlyContext",
    "System.Storage.Get",
    "System.Storage.Put",
    "System.Storage.PutEx",
    "System.Storage.Delete",
    "System.StorageContext.AsReadOnly",
    "Neo.Runtime.GetTrigger",
    "Neo.Runtime.CheckWitness",
    "Neo.Runtime.Notify",
    "Neo.Runtime.Log",
    "Neo.Runtime.GetTime",
    "Neo.Runtime.Serialize",
    "Neo.Runtime.Deserialize",
    "Neo.Blockchain.GetHeight",
    "Neo.Blockchain.GetHeader",
    "Neo.Blockchain.GetBlock",
    "Neo.Blockchain.GetTransaction",
    "Neo.Blockchain.GetAccount",
    "Neo.Blockchain.GetValidators",
    "Neo.Blockchain.GetAsset",
    "Neo.Blockchain.GetContract",
    "Neo.Header.GetHash",
    "Neo.Header.GetVersion",
    "Neo.Header.GetPrevHash",
    "Neo.Header.GetMerkleRoot",
    "Neo.Header.GetTimestamp",
    "Neo.Header.GetIndex",
    "Neo.Header.GetConsensusData",
    "Neo.Header.GetNextConsensus",
    "Neo.Block.GetTransactionCount",
    "Neo.Block.GetTransactions",
    "Neo.Block.GetTransaction",
    "Neo.Transaction.GetHash",
    "Neo.Transaction.GetType",
    "Neo.Transaction.GetAttributes",
    "Neo.Transaction.GetInputs",
    "Neo.Transaction.GetOutputs",
    "Neo.Transaction.GetReferences",
    "Neo.Transaction.GetUnspentCoins",
    "Neo.Transaction.GetWitnesses",
    "Neo.Account.GetScriptHash",
    "Neo.Account.GetVotes",
    "Neo.Account.GetBalance",
    "Neo.Account.IsStandard",
    "Neo.Asset.GetAssetId",
    "Neo.Asset.GetAssetType",
    "Neo.Asset.GetAmount",
    "Neo.Asset.GetAvailable",
    "Neo.Asset.GetPrecision",
    "Neo.Asset.GetOwner",
    "Neo.Asset.GetAdmin",
    "Neo.Asset.GetIssuer",
    "Neo.Contract.Create",
    "Neo.Contract.Migrate",
    "Neo.Contract.Destroy",
    "Neo.Contract.GetScript",
    "Neo.Contract.IsPayable",
    "Neo.Contract.GetStorageContext",
    "Neo.Storage.GetContext",
    "Neo.Storage.GetReadOnlyContext",
    "Neo.Storage.Get",
    "Neo.Storage.Put",
    "Neo.Storage.Delete",
    "Neo.Storage.Find",
    "Neo.StorageContext.AsReadOnly",
    "Neo.Enumerator.Create",
    "Neo.Enumerator.Next",
    "Neo.Enumerator.Value",
    "Neo.Enumerator.Concat",
    "Neo.Iterator.Create",
    "Neo.Iterator.Key",
    "Neo.Iterator.Keys",
    "Neo.Iterator.Values",
    "Neo.Iterator.Concat",
];

/// Hash a `SYSCALL` operand carries for `name`
pub fn interop_hash(name: &str) -> u32 {
    let digest = Sha256::digest(name.as_bytes());
    u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Resolver over [`KNOWN_INTEROP_NAMES`]
#[derive(Debug, Clone, Default)]
pub struct InteropNames {
    names: HashMap<u32, &'static str>,
}

impl InteropNames {
    /// Table of every known service
    pub fn builtin() -> Self {
        Self::from_names(KNOWN_INTEROP_NAMES)
    }

    /// Table of the given services
    pub fn from_names(names: &[&'static str]) -> Self {
        Self { names: names.iter().map(|name| (interop_hash(name), *name)).collect() }
    }
}

impl SyscallResolver for InteropNames {
    fn resolve(&self, hash: u32) -> Option<String> {
        self.names.get(&hash).map(|name| name.to_string())
    }
}
