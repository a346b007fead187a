//! Bindings for the Safe, the 4337 module and the EntryPoint.

use alloy::sol;

sol! {
    /// An operation as consumed by EntryPoint v0.7.
    ///
    /// Gas limits and fees are packed two per word, see [`crate::types::pack_gas`].
    #[derive(Debug, Default, PartialEq, Eq)]
    struct PackedUserOperation {
        address sender;
        uint256 nonce;
        bytes initCode;
        bytes callData;
        bytes32 accountGasLimits;
        uint256 preVerificationGas;
        bytes32 gasFees;
        bytes paymasterAndData;
        bytes signature;
    }

    /// Safe v1.4.1 singleton.
    #[sol(rpc)]
    contract Safe {
        /// Initial storage of the proxy.
        function setup(
            address[] calldata _owners,
            uint256 _threshold,
            address to,
            bytes calldata data,
            address fallbackHandler,
            address paymentToken,
            uint256 payment,
            address paymentReceiver
        ) external;

        /// Adds `owner` and updates the threshold.
        function addOwnerWithThreshold(address owner, uint256 _threshold) public;

        /// Removes `owner`, linked from `prevOwner`, and updates the threshold.
        function removeOwner(address prevOwner, address owner, uint256 _threshold) public;

        /// Returns the owners in linked list order.
        function getOwners() public view returns (address[] memory);
    }

    /// Safe v1.4.1 proxy factory.
    #[sol(rpc)]
    contract SafeProxyFactory {
        /// Creation code of the proxies deployed by this factory.
        function proxyCreationCode() public pure returns (bytes memory);

        /// Deploys a proxy with `CREATE2` and runs `initializer` on it.
        function createProxyWithNonce(address _singleton, bytes memory initializer, uint256 saltNonce)
            public
            returns (address proxy);
    }

    /// Helper delegate called from `setup` to enable modules.
    contract SafeModuleSetup {
        function enableModules(address[] calldata modules) external;
    }

    /// Safe4337Module v0.3.0, installed as module and fallback handler.
    #[sol(rpc)]
    contract Safe4337Module {
        /// Executes a call from the Safe. Only callable by the EntryPoint.
        function executeUserOp(address to, uint256 value, bytes calldata data, uint8 operation) external;

        /// The EIP-712 `SafeOp` digest the owner signs.
        function getOperationHash(PackedUserOperation calldata userOp)
            external
            view
            returns (bytes32 operationHash);
    }

    /// ERC-4337 EntryPoint v0.7.
    #[sol(rpc)]
    contract EntryPoint {
        /// Returns the next nonce of `sender` for the given key.
        function getNonce(address sender, uint192 key) external view returns (uint256 nonce);
    }
}
